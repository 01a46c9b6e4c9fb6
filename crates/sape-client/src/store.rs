//! Generic write-through entity store.
//!
//! An [`EntityStore`] owns the in-memory collection of one entity type and
//! keeps it in step with its [`CollectionBackend`]. The collection is only
//! replaced after the backend has confirmed a write, so a failed operation
//! leaves the store exactly as it was.
//!
//! Mutations on one store are serialized: each holds the store's write lock
//! across its backend call, which keeps read-modify-write cycles of the full
//! collection from interleaving. Readers never wait on it; they see the last
//! published snapshot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info};

use sape_shared::models::Entity;

use crate::backend::CollectionBackend;
use crate::error::{ClientError, Result};

pub struct EntityStore<T: Entity> {
    backend: Arc<dyn CollectionBackend<T>>,
    items: watch::Sender<Arc<Vec<T>>>,
    loaded: AtomicBool,
    write_lock: Mutex<()>,
}

impl<T: Entity> EntityStore<T> {
    pub fn new(backend: Arc<dyn CollectionBackend<T>>) -> Self {
        let (items, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            backend,
            items,
            loaded: AtomicBool::new(false),
            write_lock: Mutex::new(()),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Fetch the full collection from the backend, replacing the cached one.
    ///
    /// On failure the previous collection and load state are kept.
    pub async fn load(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let items = self
            .backend
            .load()
            .await
            .map_err(|e| self.failed("load", e))?;

        info!(
            kind = T::KIND,
            backend = self.backend.name(),
            count = items.len(),
            "collection loaded"
        );
        self.items.send_replace(Arc::new(items));
        self.loaded.store(true, Ordering::Release);
        Ok(())
    }

    /// Same as [`load`](Self::load); kept as the name callers use for
    /// pull-to-refresh.
    pub async fn reload(&self) -> Result<()> {
        self.load().await
    }

    /// Create `entity`, returning the stored record with its id.
    pub async fn add(&self, entity: T) -> Result<T> {
        self.ensure_loaded()?;
        let _guard = self.write_lock.lock().await;
        let current = self.get_all();

        if let Some(id) = entity.id() {
            if position(&current, id).is_some() {
                return Err(ClientError::DuplicateId {
                    kind: T::KIND,
                    id: id.to_string(),
                });
            }
        }

        let created = self
            .backend
            .create(&current, entity)
            .await
            .map_err(|e| self.failed("add", e))?;
        let id = created
            .id()
            .cloned()
            .ok_or(ClientError::MissingId(T::KIND))?;

        // The backend is the copy of record: if it hands back an id we already
        // hold, its record wins over ours.
        let mut next: Vec<T> = current
            .iter()
            .filter(|e| e.id() != Some(&id))
            .cloned()
            .collect();
        next.push(created.clone());
        self.items.send_replace(Arc::new(next));

        info!(kind = T::KIND, id = %id, "record added");
        Ok(created)
    }

    /// Replace the record with `entity`'s id. The whole record is
    /// overwritten; nothing is merged.
    pub async fn edit(&self, entity: T) -> Result<T> {
        self.ensure_loaded()?;
        let id = entity
            .id()
            .cloned()
            .ok_or(ClientError::MissingId(T::KIND))?;

        let _guard = self.write_lock.lock().await;
        let current = self.get_all();

        let Some(index) = position(&current, &id) else {
            debug!(kind = T::KIND, id = %id, "edit of unknown record");
            return Err(ClientError::NotFound {
                kind: T::KIND,
                id: id.to_string(),
            });
        };

        let mut updated = self
            .backend
            .update(&current, entity)
            .await
            .map_err(|e| self.failed("edit", e))?;
        if updated.id() != Some(&id) {
            updated.set_id(id.clone());
        }

        let mut next = current.as_ref().clone();
        next[index] = updated.clone();
        self.items.send_replace(Arc::new(next));

        info!(kind = T::KIND, id = %id, "record updated");
        Ok(updated)
    }

    /// Delete the record with `id`. Unknown ids are a no-op; returns whether
    /// a record was removed.
    pub async fn remove(&self, id: &T::Id) -> Result<bool> {
        self.ensure_loaded()?;
        let _guard = self.write_lock.lock().await;
        let current = self.get_all();

        if position(&current, id).is_none() {
            debug!(kind = T::KIND, id = %id, "remove of unknown record");
            return Ok(false);
        }

        self.backend
            .delete(&current, id)
            .await
            .map_err(|e| self.failed("remove", e))?;

        let next: Vec<T> = current
            .iter()
            .filter(|e| e.id() != Some(id))
            .cloned()
            .collect();
        self.items.send_replace(Arc::new(next));

        info!(kind = T::KIND, id = %id, "record removed");
        Ok(true)
    }

    pub fn get_by_id(&self, id: &T::Id) -> Option<T> {
        self.items
            .borrow()
            .iter()
            .find(|e| e.id() == Some(id))
            .cloned()
    }

    /// Current snapshot. Mutate through the store, never through this.
    pub fn get_all(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.items.borrow())
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<T>>> {
        self.items.subscribe()
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.is_loaded() {
            Ok(())
        } else {
            Err(ClientError::NotLoaded(T::KIND))
        }
    }

    fn failed(&self, op: &'static str, err: ClientError) -> ClientError {
        error!(
            kind = T::KIND,
            backend = self.backend.name(),
            op,
            error = %err,
            "backend operation failed"
        );
        err
    }
}

fn position<T: Entity>(items: &[T], id: &T::Id) -> Option<usize> {
    items.iter().position(|e| e.id() == Some(id))
}
