//! Durable key-value storage as seen by the stores.
//!
//! [`KeyValueStore`] is the async `get/set/remove` contract every local store
//! is written against. [`SqliteStorage`] implements it on top of
//! [`sape_store::Database`], running each call on the blocking pool.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use sape_store::Database;

use crate::error::{ClientError, Result};

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    async fn remove_item(&self, key: &str) -> Result<()>;
}

/// Read and decode the JSON under `key`.
///
/// Absent keys and undecodable values both come back as `None`; the latter is
/// logged. Storage faults are returned.
pub async fn read_json<T: DeserializeOwned>(
    storage: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>> {
    let Some(raw) = storage.get_item(key).await? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(key, error = %e, "discarding unparsable stored value");
            Ok(None)
        }
    }
}

pub async fn write_json<T: Serialize + ?Sized + Sync>(
    storage: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value).map_err(|source| sape_store::StoreError::Json {
        key: key.to_string(),
        source,
    })?;
    storage.set_item(key, &raw).await
}

#[derive(Clone)]
pub struct SqliteStorage {
    db: Arc<Mutex<Database>>,
}

impl SqliteStorage {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    async fn with_db<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Database) -> sape_store::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let guard = db
                .lock()
                .map_err(|e| ClientError::Task(format!("Lock poisoned: {e}")))?;
            f(&guard).map_err(ClientError::from)
        })
        .await
        .map_err(|e| ClientError::Task(e.to_string()))?
    }
}

#[async_trait]
impl KeyValueStore for SqliteStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.with_db(move |db| db.get_item(&key)).await
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.with_db(move |db| db.set_item(&key, &value)).await
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.with_db(move |db| db.remove_item(&key).map(|_| ()))
            .await
    }
}
