use sape_shared::models::Sport;
use sape_shared::validation::validate_sport;
use sape_shared::SportId;

use crate::error::Result;
use crate::store::EntityStore;

impl EntityStore<Sport> {
    /// Validate and store a sport form: new when it has no id, an edit
    /// otherwise. The name is trimmed first.
    pub async fn save(&self, mut sport: Sport) -> Result<Sport> {
        sport.name = sport.name.trim().to_string();
        validate_sport(&sport)?;
        if sport.id.is_some() {
            self.edit(sport).await
        } else {
            self.add(sport).await
        }
    }

    pub fn name_of(&self, id: &SportId) -> Option<String> {
        self.get_by_id(id).map(|s| s.name)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sape_shared::constants::SPORTS_KEY;
    use sape_shared::ValidationError;

    use super::*;
    use crate::backend::LocalBackend;
    use crate::error::ClientError;
    use crate::storage::{KeyValueStore, SqliteStorage};

    async fn loaded() -> EntityStore<Sport> {
        let storage: Arc<dyn KeyValueStore> = Arc::new(SqliteStorage::in_memory().unwrap());
        let store = EntityStore::new(Arc::new(LocalBackend::new(storage, SPORTS_KEY)));
        store.load().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_save_trims_and_adds_then_edits() {
        let store = loaded().await;

        let created = store.save(Sport::new("  Futebol ")).await.unwrap();
        assert_eq!(created.name, "Futebol");
        let id = created.id.clone().unwrap();

        let mut renamed = created;
        renamed.name = "Futsal".into();
        store.save(renamed).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.name_of(&id).as_deref(), Some("Futsal"));
    }

    #[tokio::test]
    async fn test_short_name_never_reaches_storage() {
        let store = loaded().await;

        let err = store.save(Sport::new("Xa")).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Validation(ValidationError::TooShort { field: "name", .. })
        ));
        assert!(store.is_empty());
    }
}
