//! Idempotent persistence of catalog records.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::IngestError;
use crate::models::CatalogRecord;
use crate::store::CatalogStore;

/// Upserts [`CatalogRecord`]s into a [`CatalogStore`].
///
/// The idempotency key is `(kit_id, name)`: upserting the same key twice
/// leaves one row carrying the second record's `category`, `metadata`,
/// and `embedding`. The parent kit must already exist; the uploader never
/// creates it. Store failures are returned as-is, without retry.
#[derive(Clone)]
pub struct Uploader {
    store: Arc<dyn CatalogStore>,
}

impl Uploader {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub async fn upsert(&self, record: &CatalogRecord) -> crate::Result<Uuid> {
        if self.store.get_kit(record.kit_id).await?.is_none() {
            return Err(IngestError::Referential {
                kit_id: record.kit_id,
            });
        }

        debug!(
            component = %record.name,
            kit_id = %record.kit_id,
            embedded = record.embedding.is_some(),
            "upserting component"
        );
        let id = self.store.upsert_component(record).await?;
        info!(component = %record.name, kit_id = %record.kit_id, %id, "component stored");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewDesignKit;
    use crate::store::memory::InMemoryStore;
    use serde_json::json;

    fn record(kit_id: Uuid, metadata: serde_json::Value) -> CatalogRecord {
        CatalogRecord {
            kit_id,
            name: "Button".to_string(),
            category: Some("inputs".to_string()),
            metadata,
            embedding: None,
        }
    }

    #[tokio::test]
    async fn second_upsert_overwrites_instead_of_duplicating() {
        let store = Arc::new(InMemoryStore::new());
        let kit = store.ensure_kit(&NewDesignKit::named("Test Design Kit")).await.unwrap();
        let uploader = Uploader::new(store.clone());

        let first_id = uploader
            .upsert(&record(kit.id, json!({"description": "first"})))
            .await
            .unwrap();
        let mut second = record(kit.id, json!({"description": "second"}));
        second.category = None;
        second.embedding = Some(vec![0.1, 0.2, 0.3]);
        let second_id = uploader.upsert(&second).await.unwrap();

        assert_eq!(first_id, second_id);
        assert_eq!(store.component_count(), 1);

        let stored = store.get_component(kit.id, "Button").await.unwrap().unwrap();
        assert_eq!(stored.metadata, json!({"description": "second"}));
        assert_eq!(stored.category, None);
        assert_eq!(stored.embedding, Some(vec![0.1, 0.2, 0.3]));
    }

    #[tokio::test]
    async fn missing_kit_is_not_created() {
        let store = Arc::new(InMemoryStore::new());
        let uploader = Uploader::new(store.clone());
        let ghost = Uuid::new_v4();

        let err = uploader.upsert(&record(ghost, json!({}))).await.unwrap_err();

        assert!(matches!(err, IngestError::Referential { kit_id } if kit_id == ghost));
        assert!(store.list_kits().await.unwrap().is_empty());
        assert_eq!(store.component_count(), 0);
    }
}
