//! Domain records shared by the stores, the local storage layer and the API.
//!
//! Every struct serializes with camelCase field names so the same JSON is
//! understood by the device storage and by the REST backend.

use std::fmt;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::constants::{ADMIN_ROLE, DEFAULT_SLOT_MINUTES};
use crate::time::TimeOfDay;
use crate::types::{ActivityId, PlaceId, SportId, UserId};

/// A record kept in an entity store, keyed by a string-like id.
///
/// The id is optional so that drafts can be handed to a store, which assigns
/// one (locally generated or server echoed) before the record is kept.
pub trait Entity:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Id: Clone
        + fmt::Debug
        + fmt::Display
        + Eq
        + From<String>
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;

    /// Short lowercase name used in logs and errors.
    const KIND: &'static str;

    fn id(&self) -> Option<&Self::Id>;

    fn set_id(&mut self, id: Self::Id);
}

// ---------------------------------------------------------------------------
// Sport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Sport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SportId>,
    pub name: String,
}

impl Sport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

impl Entity for Sport {
    type Id = SportId;
    const KIND: &'static str = "sport";

    fn id(&self) -> Option<&SportId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: SportId) {
        self.id = Some(id);
    }
}

// ---------------------------------------------------------------------------
// Place
// ---------------------------------------------------------------------------

fn default_public() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PlaceId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_capacity_participants: Option<u32>,
    #[serde(default = "default_public")]
    pub is_public: bool,
    /// Users in charge of the place. Only the API-backed variant fills this.
    #[serde(default)]
    pub responsibles: Vec<UserId>,
}

impl Place {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            reference: None,
            maximum_capacity_participants: None,
            is_public: true,
            responsibles: Vec::new(),
        }
    }
}

impl Entity for Place {
    type Id = PlaceId;
    const KIND: &'static str = "place";

    fn id(&self) -> Option<&PlaceId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: PlaceId) {
        self.id = Some(id);
    }
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

/// A scheduled sports session. `sport_id` and `place_id` are soft references.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ActivityId>,
    pub title: String,
    pub sport_id: SportId,
    pub place_id: PlaceId,
    #[serde(with = "crate::time::activity_date")]
    pub activity_date: NaiveDate,
    pub start_time: TimeOfDay,
    pub finish_time: TimeOfDay,
    #[serde(default)]
    pub is_private: bool,
}

impl Entity for Activity {
    type Id = ActivityId;
    const KIND: &'static str = "activity";

    fn id(&self) -> Option<&ActivityId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: ActivityId) {
        self.id = Some(id);
    }
}

// ---------------------------------------------------------------------------
// Subscription / presence
// ---------------------------------------------------------------------------

/// A `(user, activity)` pair. Used both for subscriptions and for
/// confirmed presences, each kept in its own list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub user_id: UserId,
    pub activity_id: ActivityId,
}

impl Subscription {
    pub fn new(user_id: UserId, activity_id: ActivityId) -> Self {
        Self {
            user_id,
            activity_id,
        }
    }

    pub fn matches(&self, user_id: &UserId, activity_id: &ActivityId) -> bool {
        &self.user_id == user_id && &self.activity_id == activity_id
    }
}

// ---------------------------------------------------------------------------
// Schedule configuration
// ---------------------------------------------------------------------------

/// Campus-wide window in which activities may be scheduled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConfig {
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    #[serde(default, alias = "duration", skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
}

impl ScheduleConfig {
    /// Inclusive on both ends.
    pub fn contains(&self, t: TimeOfDay) -> bool {
        self.start_time <= t && t <= self.end_time
    }

    pub fn slot_minutes(&self) -> u32 {
        self.duration_minutes
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_SLOT_MINUTES)
    }

    /// Consecutive `(start, finish)` slots of [`slot_minutes`](Self::slot_minutes)
    /// that fit entirely inside the window.
    pub fn slots(&self) -> Vec<(TimeOfDay, TimeOfDay)> {
        let step = self.slot_minutes();
        let mut slots = Vec::new();
        let mut start = self.start_time;
        while let Some(finish) = start.checked_add_minutes(step) {
            if finish > self.end_time {
                break;
            }
            slots.push((start, finish));
            start = finish;
        }
        slots
    }
}

// ---------------------------------------------------------------------------
// Users and sessions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    #[serde(alias = "authority")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<Role>,
}

impl User {
    /// True when either the flat `role` or one of `roles` names the admin
    /// role. Spring-style `ROLE_` prefixes are ignored.
    pub fn is_admin(&self) -> bool {
        let is_admin_name = |name: &str| {
            let name = name.strip_prefix("ROLE_").unwrap_or(name);
            name.eq_ignore_ascii_case(ADMIN_ROLE)
        };
        self.role.as_deref().is_some_and(is_admin_name)
            || self.roles.iter().any(|r| is_admin_name(&r.name))
    }
}

/// An authenticated principal: the user and its bearer token, always together.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub token: String,
}
