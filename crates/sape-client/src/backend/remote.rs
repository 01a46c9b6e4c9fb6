use std::marker::PhantomData;

use async_trait::async_trait;

use sape_api::{ApiClient, ApiResource};

use super::CollectionBackend;
use crate::error::{ClientError, Result};

/// Maps store operations onto `/{resource}` of the REST backend.
///
/// Ids are always server assigned: a client-side id on a new record is
/// ignored and the echoed record replaces the draft.
pub struct RemoteBackend<T> {
    api: ApiClient,
    _entity: PhantomData<fn() -> T>,
}

impl<T: ApiResource> RemoteBackend<T> {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<T: ApiResource> CollectionBackend<T> for RemoteBackend<T> {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn load(&self) -> Result<Vec<T>> {
        Ok(self.api.list::<T>().await?)
    }

    async fn create(&self, _existing: &[T], entity: T) -> Result<T> {
        let created = self.api.create(&entity).await?;
        if created.id().is_none() {
            return Err(ClientError::MissingId(T::KIND));
        }
        Ok(created)
    }

    async fn update(&self, _existing: &[T], entity: T) -> Result<T> {
        let id = entity.id().cloned().ok_or(ClientError::MissingId(T::KIND))?;
        Ok(self.api.update(&id, &entity).await?)
    }

    async fn delete(&self, _existing: &[T], id: &T::Id) -> Result<()> {
        Ok(self.api.remove::<T>(id).await?)
    }
}
