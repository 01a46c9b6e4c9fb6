//! Backing collaborators for [`EntityStore`](crate::store::EntityStore).
//!
//! A store never talks to storage or the network directly; it goes through a
//! [`CollectionBackend`]. Two implementations exist and are picked by
//! configuration: [`LocalBackend`] keeps the whole collection as one JSON
//! blob under a storage key, [`RemoteBackend`] maps each operation onto the
//! REST collection of the entity.

mod local;
mod remote;

use async_trait::async_trait;

use sape_shared::models::Entity;

use crate::error::Result;

pub use local::LocalBackend;
pub use remote::RemoteBackend;

#[async_trait]
pub trait CollectionBackend<T: Entity>: Send + Sync {
    /// Short label for logs (`local`, `remote`).
    fn name(&self) -> &'static str;

    /// Fetch the full collection.
    async fn load(&self) -> Result<Vec<T>>;

    /// Durably create `entity` and return the canonical record, id included.
    /// `existing` is the collection the store currently holds.
    async fn create(&self, existing: &[T], entity: T) -> Result<T>;

    /// Durably replace the record with `entity`'s id and return the
    /// canonical record. The store has already checked the id exists.
    async fn update(&self, existing: &[T], entity: T) -> Result<T>;

    /// Durably delete the record with `id`.
    async fn delete(&self, existing: &[T], id: &T::Id) -> Result<()>;
}
