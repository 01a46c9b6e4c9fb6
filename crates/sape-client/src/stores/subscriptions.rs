use std::sync::Arc;

use tokio::sync::watch;

use sape_shared::constants::{PRESENCES_KEY, SUBSCRIPTIONS_KEY};
use sape_shared::models::Subscription;
use sape_shared::{ActivityId, UserId};

use super::membership::MembershipList;
use crate::error::Result;
use crate::storage::KeyValueStore;

/// Which activities each user signed up for.
pub struct SubscriptionStore {
    list: MembershipList,
}

impl SubscriptionStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            list: MembershipList::new("subscription", storage, SUBSCRIPTIONS_KEY),
        }
    }

    pub async fn load(&self) -> Result<()> {
        self.list.load().await
    }

    pub fn is_loaded(&self) -> bool {
        self.list.is_loaded()
    }

    /// Idempotent: subscribing twice keeps a single record.
    pub async fn subscribe(&self, user: &UserId, activity: &ActivityId) -> Result<()> {
        self.list.insert(user, activity).await.map(|_| ())
    }

    pub async fn unsubscribe(&self, user: &UserId, activity: &ActivityId) -> Result<()> {
        self.list.delete(user, activity).await.map(|_| ())
    }

    pub fn is_subscribed(&self, user: &UserId, activity: &ActivityId) -> bool {
        self.list.contains(user, activity)
    }

    /// Flip the membership; returns whether the user is subscribed afterwards.
    pub async fn toggle(&self, user: &UserId, activity: &ActivityId) -> Result<bool> {
        self.list.toggle(user, activity).await
    }

    pub fn activities_for(&self, user: &UserId) -> Vec<ActivityId> {
        self.list.activities_for(user)
    }

    pub fn subscribers_of(&self, activity: &ActivityId) -> Vec<UserId> {
        self.list.users_for(activity)
    }

    pub async fn purge_activity(&self, activity: &ActivityId) -> Result<usize> {
        self.list.purge_activity(activity).await
    }

    pub fn watch(&self) -> watch::Receiver<Arc<Vec<Subscription>>> {
        self.list.subscribe()
    }
}

/// Confirmed attendance, kept apart from subscriptions.
pub struct PresenceStore {
    list: MembershipList,
}

impl PresenceStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            list: MembershipList::new("presence", storage, PRESENCES_KEY),
        }
    }

    pub async fn load(&self) -> Result<()> {
        self.list.load().await
    }

    pub fn is_loaded(&self) -> bool {
        self.list.is_loaded()
    }

    pub async fn confirm_presence(&self, user: &UserId, activity: &ActivityId) -> Result<()> {
        self.list.insert(user, activity).await.map(|_| ())
    }

    pub async fn cancel_presence(&self, user: &UserId, activity: &ActivityId) -> Result<()> {
        self.list.delete(user, activity).await.map(|_| ())
    }

    pub fn is_confirmed(&self, user: &UserId, activity: &ActivityId) -> bool {
        self.list.contains(user, activity)
    }

    pub fn confirmed_activities(&self, user: &UserId) -> Vec<ActivityId> {
        self.list.activities_for(user)
    }

    pub async fn purge_activity(&self, activity: &ActivityId) -> Result<usize> {
        self.list.purge_activity(activity).await
    }
}
