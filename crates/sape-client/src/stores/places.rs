use sape_shared::models::Place;
use sape_shared::validation::validate_place;
use sape_shared::PlaceId;

use crate::error::Result;
use crate::store::EntityStore;

impl EntityStore<Place> {
    /// Validate and store a place form. Text fields are trimmed and an empty
    /// reference is dropped. `max_capacity` is the deployment's capacity
    /// ceiling, if any.
    pub async fn save(&self, mut place: Place, max_capacity: Option<u32>) -> Result<Place> {
        place.name = place.name.trim().to_string();
        place.reference = place
            .reference
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        validate_place(&place, max_capacity)?;

        if place.id.is_some() {
            self.edit(place).await
        } else {
            self.add(place).await
        }
    }

    pub fn name_of(&self, id: &PlaceId) -> Option<String> {
        self.get_by_id(id).map(|p| p.name)
    }

    pub fn public_places(&self) -> Vec<Place> {
        self.get_all().iter().filter(|p| p.is_public).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sape_shared::constants::PLACES_KEY;
    use sape_shared::ValidationError;

    use super::*;
    use crate::backend::LocalBackend;
    use crate::error::ClientError;
    use crate::storage::{KeyValueStore, SqliteStorage};

    async fn loaded() -> EntityStore<Place> {
        let storage: Arc<dyn KeyValueStore> = Arc::new(SqliteStorage::in_memory().unwrap());
        let store = EntityStore::new(Arc::new(LocalBackend::new(storage, PLACES_KEY)));
        store.load().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_save_normalizes_fields() {
        let store = loaded().await;

        let mut draft = Place::new(" Ginásio ");
        draft.reference = Some("   ".into());
        draft.maximum_capacity_participants = Some(40);

        let saved = store.save(draft, None).await.unwrap();
        assert_eq!(saved.name, "Ginásio");
        assert_eq!(saved.reference, None);
        assert_eq!(
            store.name_of(saved.id.as_ref().unwrap()).as_deref(),
            Some("Ginásio")
        );
    }

    #[tokio::test]
    async fn test_capacity_ceiling_is_optional() {
        let store = loaded().await;
        let mut draft = Place::new("Campo de areia");
        draft.maximum_capacity_participants = Some(500);

        let err = store.save(draft.clone(), Some(400)).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Validation(ValidationError::Capacity { value: 500, max: 400 })
        ));
        assert!(store.is_empty());

        store.save(draft, None).await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_public_places() {
        let store = loaded().await;
        store.save(Place::new("Quadra 1"), None).await.unwrap();
        let mut private = Place::new("Sala de lutas");
        private.is_public = false;
        store.save(private, None).await.unwrap();

        let public: Vec<String> = store.public_places().into_iter().map(|p| p.name).collect();
        assert_eq!(public, vec!["Quadra 1"]);
    }
}
