//! Concrete stores built on [`EntityStore`](crate::store::EntityStore) and
//! the local join lists.

mod activities;
mod membership;
mod places;
mod schedule;
mod session;
mod sports;
mod subscriptions;

use sape_shared::models::{Activity, Place, Sport};

use crate::store::EntityStore;

pub use schedule::ScheduleConfigStore;
pub use session::{AuthSessionStore, Authenticator};
pub use subscriptions::{PresenceStore, SubscriptionStore};

pub type SportStore = EntityStore<Sport>;
pub type PlaceStore = EntityStore<Place>;
pub type ActivityStore = EntityStore<Activity>;
