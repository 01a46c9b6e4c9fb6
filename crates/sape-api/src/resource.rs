//! Typed CRUD over the REST collections (`/sport`, `/place`).

use serde::Serialize;

use sape_shared::constants::{DEFAULT_PLACE_CAPACITY, PLACE_RESOURCE, SPORT_RESOURCE};
use sape_shared::models::{Entity, Place, Sport};
use sape_shared::UserId;

use crate::client::ApiClient;
use crate::error::Result;

/// An entity exposed by the backend as a REST collection.
pub trait ApiResource: Entity {
    /// Collection path relative to the API base URL.
    const RESOURCE: &'static str;

    /// Body sent on create and update.
    type Payload: Serialize + Send + Sync;

    fn payload(&self) -> Self::Payload;
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SportPayload {
    pub name: String,
}

impl ApiResource for Sport {
    const RESOURCE: &'static str = SPORT_RESOURCE;
    type Payload = SportPayload;

    fn payload(&self) -> SportPayload {
        SportPayload {
            name: self.name.trim().to_string(),
        }
    }
}

/// Place body with every optional field resolved to the backend default.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlacePayload {
    pub name: String,
    pub reference: String,
    pub maximum_capacity_participants: u32,
    pub is_public: bool,
    pub responsibles: Vec<UserId>,
}

impl ApiResource for Place {
    const RESOURCE: &'static str = PLACE_RESOURCE;
    type Payload = PlacePayload;

    fn payload(&self) -> PlacePayload {
        PlacePayload {
            name: self.name.trim().to_string(),
            reference: self
                .reference
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            maximum_capacity_participants: self
                .maximum_capacity_participants
                .filter(|c| *c > 0)
                .unwrap_or(DEFAULT_PLACE_CAPACITY),
            is_public: self.is_public,
            responsibles: self.responsibles.clone(),
        }
    }
}

fn item_path<R: ApiResource>(id: &R::Id) -> String {
    format!("{}/{}", R::RESOURCE, id)
}

impl ApiClient {
    pub async fn list<R: ApiResource>(&self) -> Result<Vec<R>> {
        self.get_json(R::RESOURCE).await
    }

    /// POST the payload; returns the server's canonical record (with its id).
    pub async fn create<R: ApiResource>(&self, entity: &R) -> Result<R> {
        self.post_json(R::RESOURCE, &entity.payload()).await
    }

    /// PUT the payload to `/{resource}/{id}`; returns the server's record.
    /// Servers that echo the record without its id get it filled back in.
    pub async fn update<R: ApiResource>(&self, id: &R::Id, entity: &R) -> Result<R> {
        let mut updated: R = self.put_json(&item_path::<R>(id), &entity.payload()).await?;
        if updated.id().is_none() {
            updated.set_id(id.clone());
        }
        Ok(updated)
    }

    pub async fn remove<R: ApiResource>(&self, id: &R::Id) -> Result<()> {
        self.delete(&item_path::<R>(id)).await
    }
}
