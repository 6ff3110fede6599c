//! In-memory [`CatalogStore`] implementation for testing.
//!
//! Uses `HashMap`s behind `std::sync::RwLock`. Enforces the same
//! `(kit_id, name)` upsert key and parent-kit constraint as the SQLite
//! backend.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::IngestError;
use crate::models::{CatalogRecord, DesignKit, NewDesignKit, StoredComponent};

use super::CatalogStore;

/// In-memory store for tests and dry runs.
pub struct InMemoryStore {
    kits: RwLock<HashMap<Uuid, DesignKit>>,
    components: RwLock<HashMap<(Uuid, String), StoredComponent>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            kits: RwLock::new(HashMap::new()),
            components: RwLock::new(HashMap::new()),
        }
    }

    /// Total number of component rows across all kits.
    pub fn component_count(&self) -> usize {
        self.components.read().map(|c| c.len()).unwrap_or(0)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> IngestError {
    IngestError::Persistence {
        message: "in-memory store lock poisoned".to_string(),
        source: None,
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn get_kit(&self, id: Uuid) -> crate::Result<Option<DesignKit>> {
        let kits = self.kits.read().map_err(poisoned)?;
        Ok(kits.get(&id).cloned())
    }

    async fn find_kit_by_name(&self, name: &str) -> crate::Result<Option<DesignKit>> {
        let kits = self.kits.read().map_err(poisoned)?;
        Ok(kits.values().find(|k| k.name == name).cloned())
    }

    async fn ensure_kit(&self, kit: &NewDesignKit) -> crate::Result<DesignKit> {
        let mut kits = self.kits.write().map_err(poisoned)?;
        if let Some(existing) = kits.values().find(|k| k.name == kit.name) {
            return Ok(existing.clone());
        }
        let created = kit.clone().into_kit();
        kits.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_kits(&self) -> crate::Result<Vec<DesignKit>> {
        let kits = self.kits.read().map_err(poisoned)?;
        let mut out: Vec<DesignKit> = kits.values().cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn upsert_component(&self, record: &CatalogRecord) -> crate::Result<Uuid> {
        if !self.kits.read().map_err(poisoned)?.contains_key(&record.kit_id) {
            return Err(IngestError::Referential {
                kit_id: record.kit_id,
            });
        }

        let now = Utc::now();
        let mut components = self.components.write().map_err(poisoned)?;
        let key = (record.kit_id, record.name.clone());
        let entry = components.entry(key).or_insert_with(|| StoredComponent {
            id: Uuid::new_v4(),
            kit_id: record.kit_id,
            name: record.name.clone(),
            category: None,
            metadata: serde_json::Value::Null,
            embedding: None,
            created_at: now,
            updated_at: now,
        });
        entry.category = record.category.clone();
        entry.metadata = record.metadata.clone();
        entry.embedding = record.embedding.clone();
        entry.updated_at = now;
        Ok(entry.id)
    }

    async fn get_component(
        &self,
        kit_id: Uuid,
        name: &str,
    ) -> crate::Result<Option<StoredComponent>> {
        let components = self.components.read().map_err(poisoned)?;
        Ok(components.get(&(kit_id, name.to_string())).cloned())
    }

    async fn list_components(&self, kit_id: Uuid) -> crate::Result<Vec<StoredComponent>> {
        let components = self.components.read().map_err(poisoned)?;
        let mut out: Vec<StoredComponent> = components
            .values()
            .filter(|c| c.kit_id == kit_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(kit_id: Uuid, name: &str, metadata: serde_json::Value) -> CatalogRecord {
        CatalogRecord {
            kit_id,
            name: name.to_string(),
            category: None,
            metadata,
            embedding: None,
        }
    }

    #[tokio::test]
    async fn ensure_kit_is_idempotent_by_name() {
        let store = InMemoryStore::new();
        let first = store.ensure_kit(&NewDesignKit::named("Acme UI")).await.unwrap();
        let second = store.ensure_kit(&NewDesignKit::named("Acme UI")).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.list_kits().await.unwrap().len(), 1);
        assert_eq!(
            store.find_kit_by_name("Acme UI").await.unwrap().map(|k| k.id),
            Some(first.id)
        );
    }

    #[tokio::test]
    async fn same_name_in_different_kits_is_two_rows() {
        let store = InMemoryStore::new();
        let a = store.ensure_kit(&NewDesignKit::named("a")).await.unwrap();
        let b = store.ensure_kit(&NewDesignKit::named("b")).await.unwrap();

        store
            .upsert_component(&record(a.id, "Button", json!({"v": 1})))
            .await
            .unwrap();
        store
            .upsert_component(&record(b.id, "Button", json!({"v": 2})))
            .await
            .unwrap();

        assert_eq!(store.component_count(), 2);
        assert_eq!(store.list_components(a.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_kit_is_referential_error() {
        let store = InMemoryStore::new();
        let missing = Uuid::new_v4();
        let err = store
            .upsert_component(&record(missing, "Button", json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Referential { kit_id } if kit_id == missing));
    }
}
