//! Campus-wide activity time window.
//!
//! A singleton [`ScheduleConfig`] under one storage key. Saving overwrites
//! the whole record; there is no merge with the previous one. Until
//! [`load`](ScheduleConfigStore::load) succeeds nothing can be saved or
//! checked against the window.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{error, info};

use sape_shared::constants::SCHEDULE_CONFIG_KEY;
use sape_shared::models::ScheduleConfig;
use sape_shared::validation::ensure_ordered;
use sape_shared::{TimeOfDay, ValidationError};

use crate::error::{ClientError, Result};
use crate::storage::{read_json, write_json, KeyValueStore};

pub struct ScheduleConfigStore {
    storage: Arc<dyn KeyValueStore>,
    config: watch::Sender<Option<ScheduleConfig>>,
    loaded: AtomicBool,
    write_lock: Mutex<()>,
}

impl ScheduleConfigStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        let (config, _) = watch::channel(None);
        Self {
            storage,
            config,
            loaded: AtomicBool::new(false),
            write_lock: Mutex::new(()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Read the saved window. A missing or unreadable record leaves the store
    /// unconfigured.
    pub async fn load(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let stored: Option<ScheduleConfig> = read_json(self.storage.as_ref(), SCHEDULE_CONFIG_KEY)
            .await
            .map_err(|e| {
                error!(error = %e, "failed to load schedule configuration");
                e
            })?;

        info!(configured = stored.is_some(), "schedule configuration loaded");
        self.config.send_replace(stored);
        self.loaded.store(true, Ordering::Release);
        Ok(())
    }

    pub fn config(&self) -> Option<ScheduleConfig> {
        *self.config.borrow()
    }

    /// Replace the window. `start` must come before `end` and a duration, if
    /// given, must be positive.
    pub async fn set_config(
        &self,
        start: TimeOfDay,
        end: TimeOfDay,
        duration_minutes: Option<u32>,
    ) -> Result<ScheduleConfig> {
        self.ensure_loaded()?;
        ensure_ordered(start, end)?;
        if duration_minutes == Some(0) {
            return Err(ValidationError::ZeroDuration.into());
        }

        let config = ScheduleConfig {
            start_time: start,
            end_time: end,
            duration_minutes,
        };

        let _guard = self.write_lock.lock().await;
        write_json(self.storage.as_ref(), SCHEDULE_CONFIG_KEY, &config)
            .await
            .map_err(|e| {
                error!(error = %e, "failed to save schedule configuration");
                e
            })?;
        self.config.send_replace(Some(config));

        info!(start = %start, end = %end, ?duration_minutes, "schedule configuration saved");
        Ok(config)
    }

    /// Parse `candidate` and check it falls inside the window (inclusive).
    /// Without a saved window every well-formed time is accepted.
    pub fn validate(&self, candidate: &str) -> Result<TimeOfDay> {
        let time: TimeOfDay = candidate.parse()?;
        self.validate_time(time)?;
        Ok(time)
    }

    pub fn validate_time(&self, time: TimeOfDay) -> Result<()> {
        self.ensure_loaded()?;
        match self.config() {
            Some(cfg) if !cfg.contains(time) => Err(ValidationError::OutsideWindow {
                candidate: time.to_string(),
                start: cfg.start_time.to_string(),
                end: cfg.end_time.to_string(),
            }
            .into()),
            _ => Ok(()),
        }
    }

    /// Both ends inside the window and `start < finish`.
    pub fn validate_range(&self, start: TimeOfDay, finish: TimeOfDay) -> Result<()> {
        self.validate_time(start)?;
        self.validate_time(finish)?;
        Ok(ensure_ordered(start, finish)?)
    }

    /// Bookable slots for the saved window; empty when unconfigured.
    pub fn slots(&self) -> Vec<(TimeOfDay, TimeOfDay)> {
        self.config().map(|cfg| cfg.slots()).unwrap_or_default()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ScheduleConfig>> {
        self.config.subscribe()
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.is_loaded() {
            Ok(())
        } else {
            Err(ClientError::NotLoaded("schedule"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::FlakyStorage;
    use crate::storage::SqliteStorage;

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    async fn configured(start: &str, end: &str) -> ScheduleConfigStore {
        let storage: Arc<dyn KeyValueStore> = Arc::new(SqliteStorage::in_memory().unwrap());
        configured_on(storage, start, end).await
    }

    async fn configured_on(
        storage: Arc<dyn KeyValueStore>,
        start: &str,
        end: &str,
    ) -> ScheduleConfigStore {
        let store = ScheduleConfigStore::new(storage);
        store.load().await.unwrap();
        store.set_config(t(start), t(end), None).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_window_boundaries_are_inclusive() {
        let store = configured("08:00", "22:00").await;

        assert!(store.validate("08:00").is_ok());
        assert!(store.validate("22:00").is_ok());
        assert!(matches!(
            store.validate("07:59"),
            Err(ClientError::Validation(ValidationError::OutsideWindow { .. }))
        ));
        assert!(matches!(
            store.validate("22:01"),
            Err(ClientError::Validation(ValidationError::OutsideWindow { .. }))
        ));
    }

    #[tokio::test]
    async fn test_malformed_candidate_rejected() {
        let store = configured("08:00", "22:00").await;
        assert!(matches!(
            store.validate("8h"),
            Err(ClientError::Validation(ValidationError::InvalidTime(_)))
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_accepts_any_time() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(SqliteStorage::in_memory().unwrap());
        let store = ScheduleConfigStore::new(storage);
        store.load().await.unwrap();

        assert!(store.config().is_none());
        assert!(store.validate("03:00").is_ok());
        assert!(store.slots().is_empty());
    }

    #[tokio::test]
    async fn test_set_config_overwrites_and_persists() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(SqliteStorage::in_memory().unwrap());
        let store = ScheduleConfigStore::new(Arc::clone(&storage));
        store.load().await.unwrap();

        store.set_config(t("07:00"), t("22:00"), Some(60)).await.unwrap();
        store.set_config(t("08:00"), t("12:00"), None).await.unwrap();

        let reopened = ScheduleConfigStore::new(storage);
        reopened.load().await.unwrap();
        assert_eq!(
            reopened.config(),
            Some(ScheduleConfig {
                start_time: t("08:00"),
                end_time: t("12:00"),
                duration_minutes: None,
            })
        );
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_before_storage() {
        let flaky = FlakyStorage::new();
        let store = ScheduleConfigStore::new(flaky.clone());
        store.load().await.unwrap();
        flaky.set_failing(true);

        let err = store.set_config(t("22:00"), t("08:00"), None).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(ValidationError::InvertedRange { .. })));

        let err = store.set_config(t("08:00"), t("22:00"), Some(0)).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(ValidationError::ZeroDuration)));

        // A valid config does hit storage, which fails, and nothing changes.
        assert!(store.set_config(t("08:00"), t("22:00"), None).await.is_err());
        assert!(store.config().is_none());
    }

    #[tokio::test]
    async fn test_validate_range() {
        let store = configured("08:00", "22:00").await;
        assert!(store.validate_range(t("10:00"), t("11:00")).is_ok());
        assert!(store.validate_range(t("11:00"), t("10:00")).is_err());
        assert!(store.validate_range(t("21:30"), t("22:30")).is_err());
    }

    #[tokio::test]
    async fn test_unloaded_store_rejects_everything() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(SqliteStorage::in_memory().unwrap());
        configured_on(Arc::clone(&storage), "08:00", "22:00").await;

        let unloaded = ScheduleConfigStore::new(storage);
        assert!(!unloaded.is_loaded());
        assert!(matches!(
            unloaded.validate("03:00"),
            Err(ClientError::NotLoaded("schedule"))
        ));
        assert!(matches!(
            unloaded.set_config(t("06:00"), t("23:00"), None).await,
            Err(ClientError::NotLoaded("schedule"))
        ));

        unloaded.load().await.unwrap();
        assert!(unloaded.validate("03:00").is_err());
        assert!(unloaded.validate("09:00").is_ok());
    }

    #[tokio::test]
    async fn test_failed_load_stays_unloaded() {
        let flaky = FlakyStorage::new();
        flaky.set_failing(true);
        let store = ScheduleConfigStore::new(flaky.clone());

        assert!(store.load().await.is_err());
        assert!(matches!(
            store.validate_range(t("10:00"), t("11:00")),
            Err(ClientError::NotLoaded("schedule"))
        ));
    }
}
