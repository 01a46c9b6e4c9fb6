use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use tracing::debug;

use sape_shared::constants::LOCAL_ID_SPACE;
use sape_shared::models::Entity;

use super::CollectionBackend;
use crate::error::Result;
use crate::storage::{read_json, write_json, KeyValueStore};

const RANDOM_ID_ATTEMPTS: usize = 32;

/// Keeps the whole collection as one JSON array under `key`.
///
/// Every mutation rewrites the full array, so the stored blob always matches
/// the collection the store will hold once the call returns.
pub struct LocalBackend<T> {
    storage: Arc<dyn KeyValueStore>,
    key: &'static str,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> LocalBackend<T> {
    pub fn new(storage: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self {
            storage,
            key,
            _entity: PhantomData,
        }
    }

    async fn write(&self, items: &[T]) -> Result<()> {
        write_json(self.storage.as_ref(), self.key, items).await?;
        debug!(key = self.key, count = items.len(), "collection persisted");
        Ok(())
    }
}

/// Pseudo-random numeric id not used by any record in `existing`.
fn generate_id<T: Entity>(existing: &[T]) -> T::Id {
    let taken: HashSet<String> = existing
        .iter()
        .filter_map(|e| e.id().map(ToString::to_string))
        .collect();

    let mut rng = rand::thread_rng();
    for _ in 0..RANDOM_ID_ATTEMPTS {
        let candidate = rng.gen_range(0..LOCAL_ID_SPACE).to_string();
        if !taken.contains(&candidate) {
            return T::Id::from(candidate);
        }
    }

    // Crowded id space: one past the largest numeric id is always free.
    let next = taken
        .iter()
        .filter_map(|id| id.parse::<u64>().ok())
        .max()
        .map_or(0, |max| max + 1);
    T::Id::from(next.to_string())
}

#[async_trait]
impl<T: Entity> CollectionBackend<T> for LocalBackend<T> {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn load(&self) -> Result<Vec<T>> {
        Ok(read_json(self.storage.as_ref(), self.key)
            .await?
            .unwrap_or_default())
    }

    async fn create(&self, existing: &[T], mut entity: T) -> Result<T> {
        if entity.id().is_none() {
            entity.set_id(generate_id(existing));
        }

        let mut next = existing.to_vec();
        next.push(entity.clone());
        self.write(&next).await?;
        Ok(entity)
    }

    async fn update(&self, existing: &[T], entity: T) -> Result<T> {
        let next: Vec<T> = existing
            .iter()
            .map(|e| {
                if e.id() == entity.id() {
                    entity.clone()
                } else {
                    e.clone()
                }
            })
            .collect();
        self.write(&next).await?;
        Ok(entity)
    }

    async fn delete(&self, existing: &[T], id: &T::Id) -> Result<()> {
        let next: Vec<T> = existing
            .iter()
            .filter(|e| e.id() != Some(id))
            .cloned()
            .collect();
        self.write(&next).await
    }
}
