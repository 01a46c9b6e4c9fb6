/// Local storage key for the activities collection
pub const ACTIVITIES_KEY: &str = "@SapeApp:activities";

/// Local storage key for the sports collection
pub const SPORTS_KEY: &str = "@SapeApp:sports";

/// Local storage key for the places collection
pub const PLACES_KEY: &str = "@SapeApp:places";

/// Local storage key for the `{userId, activityId}` subscription list
pub const SUBSCRIPTIONS_KEY: &str = "@SapeApp:inscriptions";

/// Local storage key for the `{userId, activityId}` confirmed presence list
pub const PRESENCES_KEY: &str = "@SapeApp:presences";

/// Local storage key for the schedule configuration singleton
pub const SCHEDULE_CONFIG_KEY: &str = "@schedule_config";

/// Local storage key for the authenticated user (JSON)
pub const AUTH_USER_KEY: &str = "@SAPE:user";

/// Local storage key for the bearer token (raw string)
pub const AUTH_TOKEN_KEY: &str = "@SAPE:token";

/// REST collection for sports
pub const SPORT_RESOURCE: &str = "sport";

/// REST collection for places
pub const PLACE_RESOURCE: &str = "place";

/// Default API base URL (Android emulator loopback)
pub const DEFAULT_API_URL: &str = "http://10.0.2.2:8080/api";

/// Default HTTP timeout in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Capacity sent to the API when a place has none (or zero)
pub const DEFAULT_PLACE_CAPACITY: u32 = 100;

/// Default length of a schedule slot in minutes
pub const DEFAULT_SLOT_MINUTES: u32 = 60;

/// Exclusive upper bound for locally generated ids
pub const LOCAL_ID_SPACE: u32 = 1_000_000;

/// Minimum trimmed length of a sport name
pub const MIN_SPORT_NAME_LEN: usize = 3;

/// Minimum trimmed length of a place name
pub const MIN_PLACE_NAME_LEN: usize = 4;

/// Minimum trimmed length of a place reference, when one is given
pub const MIN_PLACE_REFERENCE_LEN: usize = 3;

/// Minimum trimmed length of an activity title
pub const MIN_ACTIVITY_TITLE_LEN: usize = 5;

/// Label shown when an activity's sport reference does not resolve
pub const UNKNOWN_SPORT_LABEL: &str = "Esporte não encontrado";

/// Label shown when an activity's place reference does not resolve
pub const UNKNOWN_PLACE_LABEL: &str = "Local não encontrado";

/// Role name granting administrative screens
pub const ADMIN_ROLE: &str = "admin";
