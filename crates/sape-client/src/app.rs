//! The composition root.
//!
//! [`Sape`] owns one instance of every store, wired to the storage and
//! backends selected by [`ClientConfig`]. Screens hold an `Arc<Sape>` and
//! talk to the stores through it; nothing else constructs a store.

use std::sync::Arc;

use tracing::{info, warn};

use sape_api::{ApiClient, ApiResource};
use sape_shared::constants::{
    ACTIVITIES_KEY, PLACES_KEY, SPORTS_KEY, UNKNOWN_PLACE_LABEL, UNKNOWN_SPORT_LABEL,
};
use sape_shared::models::{Activity, Place, Sport};
use sape_shared::validation::validate_activity;
use sape_shared::{ActivityId, UserId, ValidationError};
use sape_store::Database;

use crate::backend::{CollectionBackend, LocalBackend, RemoteBackend};
use crate::config::{BackendKind, ClientConfig};
use crate::error::Result;
use crate::storage::{KeyValueStore, SqliteStorage};
use crate::store::EntityStore;
use crate::stores::{
    ActivityStore, AuthSessionStore, Authenticator, PlaceStore, PresenceStore,
    ScheduleConfigStore, SportStore, SubscriptionStore,
};

/// An activity with its soft references resolved for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityView {
    pub activity: Activity,
    pub sport_name: String,
    pub place_name: String,
    pub subscribers: usize,
}

pub struct Sape {
    config: ClientConfig,
    api: ApiClient,
    sports: SportStore,
    places: PlaceStore,
    activities: ActivityStore,
    subscriptions: SubscriptionStore,
    presences: PresenceStore,
    schedule: ScheduleConfigStore,
    session: AuthSessionStore,
}

impl Sape {
    /// Open the database named by `config` and build every store on it.
    pub fn build(config: ClientConfig) -> Result<Self> {
        let db = match (&config.db_path, &config.data_dir) {
            (Some(path), _) => Database::open_at(path)?,
            (None, Some(dir)) => Database::open_in_dir(dir)?,
            (None, None) => Database::open_default()?,
        };
        let storage: Arc<dyn KeyValueStore> = Arc::new(SqliteStorage::new(db));
        Self::with_storage(config, storage)
    }

    /// Build on an already-open storage. Logins go to the REST backend.
    pub fn with_storage(config: ClientConfig, storage: Arc<dyn KeyValueStore>) -> Result<Self> {
        let api = ApiClient::new(&config.api_config())?;
        let authenticator: Arc<dyn Authenticator> = Arc::new(api.clone());
        Ok(Self::assemble(config, storage, api, authenticator))
    }

    /// Build with a custom credential check in place of `POST /login`.
    pub fn with_authenticator(
        config: ClientConfig,
        storage: Arc<dyn KeyValueStore>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Result<Self> {
        let api = ApiClient::new(&config.api_config())?;
        Ok(Self::assemble(config, storage, api, authenticator))
    }

    fn assemble(
        config: ClientConfig,
        storage: Arc<dyn KeyValueStore>,
        api: ApiClient,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        info!(
            backend = %config.backend,
            api_url = %config.api_url,
            "assembling stores"
        );

        let sports = EntityStore::new(backend_for::<Sport>(
            config.backend,
            &storage,
            &api,
            SPORTS_KEY,
        ));
        let places = EntityStore::new(backend_for::<Place>(
            config.backend,
            &storage,
            &api,
            PLACES_KEY,
        ));
        let activities = EntityStore::new(Arc::new(LocalBackend::new(
            Arc::clone(&storage),
            ACTIVITIES_KEY,
        )));

        Self {
            sports,
            places,
            activities,
            subscriptions: SubscriptionStore::new(Arc::clone(&storage)),
            presences: PresenceStore::new(Arc::clone(&storage)),
            schedule: ScheduleConfigStore::new(Arc::clone(&storage)),
            session: AuthSessionStore::new(storage, authenticator).with_api_client(api.clone()),
            api,
            config,
        }
    }

    /// Restore the session, then load every store concurrently.
    ///
    /// Failures are logged and do not stop the others; the names of the
    /// stores that failed are returned so the caller can offer a retry.
    pub async fn start(&self) -> Vec<&'static str> {
        let mut failed = Vec::new();

        if let Err(e) = self.session.restore().await {
            warn!(error = %e, "session restore failed, starting logged out");
            failed.push("session");
        }

        let (sports, places, activities, subscriptions, presences, schedule) = futures::join!(
            self.sports.load(),
            self.places.load(),
            self.activities.load(),
            self.subscriptions.load(),
            self.presences.load(),
            self.schedule.load()
        );

        for (name, outcome) in [
            ("sports", sports),
            ("places", places),
            ("activities", activities),
            ("subscriptions", subscriptions),
            ("presences", presences),
            ("schedule", schedule),
        ] {
            if let Err(e) = outcome {
                warn!(store = name, error = %e, "store failed to load");
                failed.push(name);
            }
        }

        info!(failed = failed.len(), "startup finished");
        failed
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn sports(&self) -> &SportStore {
        &self.sports
    }

    pub fn places(&self) -> &PlaceStore {
        &self.places
    }

    pub fn activities(&self) -> &ActivityStore {
        &self.activities
    }

    pub fn subscriptions(&self) -> &SubscriptionStore {
        &self.subscriptions
    }

    pub fn presences(&self) -> &PresenceStore {
        &self.presences
    }

    pub fn schedule(&self) -> &ScheduleConfigStore {
        &self.schedule
    }

    pub fn session(&self) -> &AuthSessionStore {
        &self.session
    }

    pub fn current_user_id(&self) -> Result<UserId> {
        self.session.user_id()
    }

    /// Save a place form under the configured capacity ceiling.
    pub async fn save_place(&self, place: Place) -> Result<Place> {
        self.places.save(place, self.config.max_place_capacity).await
    }

    /// Check an activity draft against the forms' rules, its references and
    /// the schedule window, then store it.
    pub async fn schedule_activity(&self, draft: Activity) -> Result<Activity> {
        validate_activity(&draft)?;

        if self.sports.get_by_id(&draft.sport_id).is_none() {
            return Err(ValidationError::UnresolvedReference {
                kind: "sport",
                id: draft.sport_id.to_string(),
            }
            .into());
        }
        if self.places.get_by_id(&draft.place_id).is_none() {
            return Err(ValidationError::UnresolvedReference {
                kind: "place",
                id: draft.place_id.to_string(),
            }
            .into());
        }

        self.schedule
            .validate_range(draft.start_time, draft.finish_time)?;

        self.activities.add(draft).await
    }

    /// Resolve the activity's sport and place names. Dangling references
    /// show placeholder labels.
    pub fn describe_activity(&self, id: &ActivityId) -> Option<ActivityView> {
        let activity = self.activities.get_by_id(id)?;
        let sport_name = self
            .sports
            .name_of(&activity.sport_id)
            .unwrap_or_else(|| UNKNOWN_SPORT_LABEL.to_string());
        let place_name = self
            .places
            .name_of(&activity.place_id)
            .unwrap_or_else(|| UNKNOWN_PLACE_LABEL.to_string());
        let subscribers = self.subscriptions.subscribers_of(id).len();

        Some(ActivityView {
            activity,
            sport_name,
            place_name,
            subscribers,
        })
    }

    /// Remove an activity together with its subscriptions and presences.
    ///
    /// Once the activity is gone the delete has succeeded; a failed purge is
    /// only logged. Leftover pairs point at nothing and readers skip them.
    pub async fn delete_activity(&self, id: &ActivityId) -> Result<bool> {
        if !self.activities.remove(id).await? {
            return Ok(false);
        }
        if let Err(e) = self.subscriptions.purge_activity(id).await {
            warn!(
                activity_id = %id,
                error = %e,
                "subscriptions left behind for deleted activity"
            );
        }
        if let Err(e) = self.presences.purge_activity(id).await {
            warn!(
                activity_id = %id,
                error = %e,
                "presences left behind for deleted activity"
            );
        }
        Ok(true)
    }

    /// Subscribe or unsubscribe the logged-in user. Returns whether they are
    /// subscribed afterwards.
    pub async fn toggle_subscription(&self, activity: &ActivityId) -> Result<bool> {
        let user = self.current_user_id()?;
        self.subscriptions.toggle(&user, activity).await
    }

    pub async fn confirm_presence(&self, activity: &ActivityId) -> Result<()> {
        let user = self.current_user_id()?;
        self.presences.confirm_presence(&user, activity).await
    }

    /// Activities the logged-in user is subscribed to that still exist.
    pub fn my_activities(&self) -> Result<Vec<Activity>> {
        let user = self.current_user_id()?;
        Ok(self
            .subscriptions
            .activities_for(&user)
            .iter()
            .filter_map(|id| self.activities.get_by_id(id))
            .collect())
    }
}

fn backend_for<T: ApiResource>(
    kind: BackendKind,
    storage: &Arc<dyn KeyValueStore>,
    api: &ApiClient,
    key: &'static str,
) -> Arc<dyn CollectionBackend<T>> {
    match kind {
        BackendKind::Local => Arc::new(LocalBackend::new(Arc::clone(storage), key)),
        BackendKind::Remote => Arc::new(RemoteBackend::new(api.clone())),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use sape_shared::constants::{AUTH_TOKEN_KEY, AUTH_USER_KEY};
    use sape_shared::{PlaceId, SportId};

    use super::*;
    use crate::error::ClientError;

    fn t(s: &str) -> sape_shared::TimeOfDay {
        s.parse().unwrap()
    }

    fn draft(title: &str, sport: &SportId, place: &PlaceId, start: &str, finish: &str) -> Activity {
        Activity {
            id: None,
            title: title.into(),
            sport_id: sport.clone(),
            place_id: place.clone(),
            activity_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            start_time: t(start),
            finish_time: t(finish),
            is_private: false,
        }
    }

    async fn logged_in_app() -> Sape {
        let storage: Arc<dyn KeyValueStore> = Arc::new(SqliteStorage::in_memory().unwrap());
        storage
            .set_item(AUTH_USER_KEY, r#"{"id": 42, "name": "Bia"}"#)
            .await
            .unwrap();
        storage.set_item(AUTH_TOKEN_KEY, "jwt").await.unwrap();

        let app = Sape::with_storage(ClientConfig::default(), storage).unwrap();
        assert!(app.start().await.is_empty());
        app
    }

    async fn seed(app: &Sape) -> (SportId, PlaceId) {
        let sport = app.sports().save(Sport::new("Futebol")).await.unwrap();
        let place = app.save_place(Place::new("Campo society")).await.unwrap();
        (sport.id.unwrap(), place.id.unwrap())
    }

    #[tokio::test]
    async fn test_start_restores_session_and_token() {
        let app = logged_in_app().await;
        assert_eq!(app.current_user_id().unwrap(), UserId::from("42"));
        assert_eq!(app.api().token().as_deref(), Some("jwt"));
        assert!(app.sports().is_loaded());
        assert!(app.subscriptions().is_loaded());
    }

    #[tokio::test]
    async fn test_schedule_and_describe_activity() {
        let app = logged_in_app().await;
        let (sport, place) = seed(&app).await;
        app.schedule()
            .set_config(t("08:00"), t("22:00"), None)
            .await
            .unwrap();

        let before = app.activities().len();
        let created = app
            .schedule_activity(draft("Pelada de sexta", &sport, &place, "08:00", "09:00"))
            .await
            .unwrap();
        assert_eq!(app.activities().len(), before + 1);
        let id = created.id.clone().unwrap();

        let view = app.describe_activity(&id).unwrap();
        assert_eq!(view.sport_name, "Futebol");
        assert_eq!(view.place_name, "Campo society");
        assert_eq!(view.subscribers, 0);
    }

    #[tokio::test]
    async fn test_schedule_activity_rejections() {
        let app = logged_in_app().await;
        let (sport, place) = seed(&app).await;
        app.schedule()
            .set_config(t("08:00"), t("22:00"), None)
            .await
            .unwrap();

        let err = app
            .schedule_activity(draft("Jogo", &sport, &place, "10:00", "11:00"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Validation(ValidationError::TooShort { field: "title", .. })
        ));

        let err = app
            .schedule_activity(draft("Pelada", &SportId::from("999"), &place, "10:00", "11:00"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Validation(ValidationError::UnresolvedReference { kind: "sport", .. })
        ));

        let err = app
            .schedule_activity(draft("Pelada", &sport, &place, "07:59", "09:00"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Validation(ValidationError::OutsideWindow { .. })
        ));

        assert!(app.activities().is_empty());
    }

    #[tokio::test]
    async fn test_dangling_references_show_placeholders() {
        let app = logged_in_app().await;
        let (sport, place) = seed(&app).await;
        let created = app
            .schedule_activity(draft("Treino livre", &sport, &place, "10:00", "11:00"))
            .await
            .unwrap();

        app.sports().remove(&sport).await.unwrap();
        app.places().remove(&place).await.unwrap();

        let view = app.describe_activity(created.id.as_ref().unwrap()).unwrap();
        assert_eq!(view.sport_name, UNKNOWN_SPORT_LABEL);
        assert_eq!(view.place_name, UNKNOWN_PLACE_LABEL);
    }

    #[tokio::test]
    async fn test_subscription_flow_for_current_user() {
        let app = logged_in_app().await;
        let (sport, place) = seed(&app).await;
        let created = app
            .schedule_activity(draft("Vôlei de praia", &sport, &place, "10:00", "11:00"))
            .await
            .unwrap();
        let id = created.id.clone().unwrap();

        assert!(app.toggle_subscription(&id).await.unwrap());
        app.confirm_presence(&id).await.unwrap();
        assert_eq!(app.my_activities().unwrap(), vec![created]);
        assert_eq!(app.describe_activity(&id).unwrap().subscribers, 1);

        assert!(app.delete_activity(&id).await.unwrap());
        let user = app.current_user_id().unwrap();
        assert!(!app.subscriptions().is_subscribed(&user, &id));
        assert!(!app.presences().is_confirmed(&user, &id));
        assert!(!app.delete_activity(&id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_survives_failed_purge() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(SqliteStorage::in_memory().unwrap());
        let app = Sape::with_storage(ClientConfig::default(), storage).unwrap();
        // Subscriptions and presences never load, so purging them fails.
        app.activities().load().await.unwrap();
        let created = app
            .activities()
            .add(draft(
                "Corrida no campus",
                &SportId::from("1"),
                &PlaceId::from("1"),
                "10:00",
                "11:00",
            ))
            .await
            .unwrap();
        let id = created.id.unwrap();

        assert!(app.delete_activity(&id).await.unwrap());
        assert!(app.activities().get_by_id(&id).is_none());
    }

    #[tokio::test]
    async fn test_schedule_activity_needs_loaded_window() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(SqliteStorage::in_memory().unwrap());
        let app = Sape::with_storage(ClientConfig::default(), storage).unwrap();
        app.sports().load().await.unwrap();
        app.places().load().await.unwrap();
        app.activities().load().await.unwrap();
        let (sport, place) = seed(&app).await;

        let err = app
            .schedule_activity(draft("Pelada noturna", &sport, &place, "03:00", "04:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotLoaded("schedule")));
        assert!(app.activities().is_empty());
    }

    #[tokio::test]
    async fn test_subscription_needs_a_session() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(SqliteStorage::in_memory().unwrap());
        let app = Sape::with_storage(ClientConfig::default(), storage).unwrap();
        app.start().await;

        let err = app
            .toggle_subscription(&ActivityId::from("a1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NoSession));
    }

    #[tokio::test]
    async fn test_build_persists_across_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            data_dir: Some(dir.path().to_path_buf()),
            ..ClientConfig::default()
        };

        {
            let app = Sape::build(config.clone()).unwrap();
            app.start().await;
            app.sports().save(Sport::new("Basquete")).await.unwrap();
        }

        let app = Sape::build(config).unwrap();
        app.start().await;
        let names: Vec<String> = app.sports().get_all().iter().map(|s| s.name.clone()).collect();
        assert_eq!(names, vec!["Basquete"]);
    }

    #[tokio::test]
    async fn test_remote_backend_for_sports_and_places() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/sport")
            .with_status(200)
            .with_body(json!([{"id": 1, "name": "Futebol"}]).to_string())
            .create_async()
            .await;
        server
            .mock("GET", "/place")
            .with_status(503)
            .create_async()
            .await;

        let config = ClientConfig {
            api_url: server.url(),
            backend: BackendKind::Remote,
            ..ClientConfig::default()
        };
        let storage: Arc<dyn KeyValueStore> = Arc::new(SqliteStorage::in_memory().unwrap());
        let app = Sape::with_storage(config, storage).unwrap();

        assert_eq!(app.start().await, vec!["places"]);
        assert_eq!(app.sports().backend_name(), "remote");
        assert_eq!(app.sports().name_of(&SportId::from("1")).as_deref(), Some("Futebol"));
        assert!(!app.places().is_loaded());
        assert_eq!(app.activities().backend_name(), "local");
    }
}
