//! `(user, activity)` join lists: subscriptions and confirmed presences.
//!
//! Both are the same shape: a list of [`Subscription`] pairs persisted whole
//! under one storage key, at most one record per pair. Operations are always
//! scoped to an explicit user id.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{error, info};

use sape_shared::models::Subscription;
use sape_shared::{ActivityId, UserId};

use crate::error::{ClientError, Result};
use crate::storage::{read_json, write_json, KeyValueStore};

pub struct MembershipList {
    kind: &'static str,
    key: &'static str,
    storage: Arc<dyn KeyValueStore>,
    records: watch::Sender<Arc<Vec<Subscription>>>,
    loaded: AtomicBool,
    write_lock: Mutex<()>,
}

impl MembershipList {
    pub fn new(kind: &'static str, storage: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        let (records, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            kind,
            key,
            storage,
            records,
            loaded: AtomicBool::new(false),
            write_lock: Mutex::new(()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    pub async fn load(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let records: Vec<Subscription> = read_json(self.storage.as_ref(), self.key)
            .await
            .map_err(|e| self.failed("load", e))?
            .unwrap_or_default();

        info!(kind = self.kind, count = records.len(), "memberships loaded");
        self.records.send_replace(Arc::new(records));
        self.loaded.store(true, Ordering::Release);
        Ok(())
    }

    /// Add the pair unless it already exists. Returns whether it was added.
    pub async fn insert(&self, user: &UserId, activity: &ActivityId) -> Result<bool> {
        self.ensure_loaded()?;
        let _guard = self.write_lock.lock().await;
        let current = self.all();

        if current.iter().any(|r| r.matches(user, activity)) {
            return Ok(false);
        }

        let mut next = current.as_ref().clone();
        next.push(Subscription::new(user.clone(), activity.clone()));
        self.persist(next).await?;

        info!(kind = self.kind, user_id = %user, activity_id = %activity, "membership added");
        Ok(true)
    }

    /// Flip the pair in one locked step: remove every record of it if present,
    /// add it otherwise. Returns whether the pair is present afterwards.
    pub async fn toggle(&self, user: &UserId, activity: &ActivityId) -> Result<bool> {
        self.ensure_loaded()?;
        let _guard = self.write_lock.lock().await;
        let current = self.all();

        let present = current.iter().any(|r| r.matches(user, activity));
        let next: Vec<Subscription> = if present {
            current
                .iter()
                .filter(|r| !r.matches(user, activity))
                .cloned()
                .collect()
        } else {
            let mut next = current.as_ref().clone();
            next.push(Subscription::new(user.clone(), activity.clone()));
            next
        };
        self.persist(next).await?;

        info!(
            kind = self.kind,
            user_id = %user,
            activity_id = %activity,
            present = !present,
            "membership toggled"
        );
        Ok(!present)
    }

    /// Remove every record of the pair. Returns how many were removed.
    pub async fn delete(&self, user: &UserId, activity: &ActivityId) -> Result<usize> {
        self.retain(|r| !r.matches(user, activity)).await
    }

    /// Remove every record pointing at `activity`, whoever the user.
    pub async fn purge_activity(&self, activity: &ActivityId) -> Result<usize> {
        self.retain(|r| &r.activity_id != activity).await
    }

    pub fn contains(&self, user: &UserId, activity: &ActivityId) -> bool {
        self.records
            .borrow()
            .iter()
            .any(|r| r.matches(user, activity))
    }

    pub fn activities_for(&self, user: &UserId) -> Vec<ActivityId> {
        self.records
            .borrow()
            .iter()
            .filter(|r| &r.user_id == user)
            .map(|r| r.activity_id.clone())
            .collect()
    }

    pub fn users_for(&self, activity: &ActivityId) -> Vec<UserId> {
        self.records
            .borrow()
            .iter()
            .filter(|r| &r.activity_id == activity)
            .map(|r| r.user_id.clone())
            .collect()
    }

    pub fn all(&self) -> Arc<Vec<Subscription>> {
        Arc::clone(&self.records.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Subscription>>> {
        self.records.subscribe()
    }

    async fn retain<F>(&self, keep: F) -> Result<usize>
    where
        F: Fn(&Subscription) -> bool,
    {
        self.ensure_loaded()?;
        let _guard = self.write_lock.lock().await;
        let current = self.all();

        let next: Vec<Subscription> = current.iter().filter(|r| keep(r)).cloned().collect();
        let removed = current.len() - next.len();
        if removed == 0 {
            return Ok(0);
        }

        self.persist(next).await?;
        info!(kind = self.kind, removed, "memberships removed");
        Ok(removed)
    }

    // Write first, publish after: a failed write leaves memory untouched.
    async fn persist(&self, next: Vec<Subscription>) -> Result<()> {
        write_json(self.storage.as_ref(), self.key, &next)
            .await
            .map_err(|e| self.failed("persist", e))?;
        self.records.send_replace(Arc::new(next));
        Ok(())
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.is_loaded() {
            Ok(())
        } else {
            Err(ClientError::NotLoaded(self.kind))
        }
    }

    fn failed(&self, op: &'static str, err: ClientError) -> ClientError {
        error!(kind = self.kind, op, error = %err, "membership storage failed");
        err
    }
}
