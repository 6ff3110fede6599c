//! Integration tests for the SQLite catalog store.

use serde_json::json;
use tempfile::TempDir;
use uuid::Uuid;

use kit_catalog::config::{
    Config, DbConfig, DiscoveryConfig, EmbeddingConfig, ExtractionConfig, PipelineConfig,
};
use kit_catalog::sqlite_store::SqliteStore;
use kit_catalog_core::models::{CatalogRecord, NewDesignKit};
use kit_catalog_core::store::CatalogStore;
use kit_catalog_core::upload::Uploader;
use kit_catalog_core::IngestError;

fn test_config(tmp: &TempDir) -> Config {
    Config {
        db: DbConfig {
            path: tmp.path().join("data").join("catalog.sqlite"),
            busy_timeout_secs: 5,
        },
        extraction: ExtractionConfig::default(),
        embedding: EmbeddingConfig::default(),
        discovery: DiscoveryConfig::default(),
        pipeline: PipelineConfig::default(),
    }
}

fn record(kit_id: Uuid, category: &str, description: &str) -> CatalogRecord {
    CatalogRecord {
        kit_id,
        name: "Button".to_string(),
        category: Some(category.to_string()),
        metadata: json!({"componentName": "Button", "description": description}),
        embedding: None,
    }
}

#[tokio::test]
async fn ensure_kit_is_create_or_return() {
    let tmp = TempDir::new().unwrap();
    let store = SqliteStore::open(&test_config(&tmp)).await.unwrap();

    let first = store
        .ensure_kit(&NewDesignKit {
            name: "Test Design Kit".to_string(),
            description: Some("Kit for tests".to_string()),
            personality_tags: vec!["playful".to_string(), "rounded".to_string()],
        })
        .await
        .unwrap();
    let second = store
        .ensure_kit(&NewDesignKit::named("Test Design Kit"))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.description.as_deref(), Some("Kit for tests"));
    assert_eq!(second.personality_tags, vec!["playful", "rounded"]);
    assert_eq!(store.list_kits().await.unwrap().len(), 1);
    assert_eq!(store.get_kit(first.id).await.unwrap().unwrap().name, "Test Design Kit");
    assert!(store.find_kit_by_name("Other").await.unwrap().is_none());
}

#[tokio::test]
async fn upsert_is_idempotent_on_kit_and_name() {
    let tmp = TempDir::new().unwrap();
    let store = SqliteStore::open(&test_config(&tmp)).await.unwrap();
    let kit = store
        .ensure_kit(&NewDesignKit::named("Test Design Kit"))
        .await
        .unwrap();

    let first_id = store
        .upsert_component(&record(kit.id, "inputs", "first"))
        .await
        .unwrap();
    let second_id = store
        .upsert_component(&record(kit.id, "actions", "second").with_embedding(vec![0.5, -1.0, 2.0]))
        .await
        .unwrap();

    assert_eq!(first_id, second_id);

    let components = store.list_components(kit.id).await.unwrap();
    assert_eq!(components.len(), 1);

    let stored = &components[0];
    assert_eq!(stored.id, first_id);
    assert_eq!(stored.category.as_deref(), Some("actions"));
    assert_eq!(stored.metadata["description"], "second");
    assert_eq!(stored.embedding, Some(vec![0.5, -1.0, 2.0]));
    assert!(stored.updated_at >= stored.created_at);
}

#[tokio::test]
async fn same_name_in_two_kits_is_two_rows() {
    let tmp = TempDir::new().unwrap();
    let store = SqliteStore::open(&test_config(&tmp)).await.unwrap();
    let a = store.ensure_kit(&NewDesignKit::named("A")).await.unwrap();
    let b = store.ensure_kit(&NewDesignKit::named("B")).await.unwrap();

    let id_a = store.upsert_component(&record(a.id, "x", "a")).await.unwrap();
    let id_b = store.upsert_component(&record(b.id, "x", "b")).await.unwrap();

    assert_ne!(id_a, id_b);
    assert_eq!(
        store.get_component(b.id, "Button").await.unwrap().unwrap().metadata["description"],
        "b"
    );
}

#[tokio::test]
async fn missing_kit_is_referential() {
    let tmp = TempDir::new().unwrap();
    let store = SqliteStore::open(&test_config(&tmp)).await.unwrap();
    let kit_id = Uuid::new_v4();

    let err = store
        .upsert_component(&record(kit_id, "inputs", "orphan"))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Referential { kit_id: id } if id == kit_id));
    assert!(store.list_components(kit_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn uploader_over_sqlite() {
    let tmp = TempDir::new().unwrap();
    let store = std::sync::Arc::new(SqliteStore::open(&test_config(&tmp)).await.unwrap());
    let kit = store
        .ensure_kit(&NewDesignKit::named("Test Design Kit"))
        .await
        .unwrap();
    let uploader = Uploader::new(store.clone());

    uploader.upsert(&record(kit.id, "inputs", "v1")).await.unwrap();
    uploader.upsert(&record(kit.id, "inputs", "v2")).await.unwrap();

    let components = store.list_components(kit.id).await.unwrap();
    assert_eq!(components.len(), 1);
    assert_eq!(components[0].metadata["description"], "v2");

    let err = uploader
        .upsert(&record(Uuid::new_v4(), "inputs", "orphan"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "referential");
}

#[tokio::test]
async fn schema_survives_reopen() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);

    let store = SqliteStore::open(&config).await.unwrap();
    let kit = store.ensure_kit(&NewDesignKit::named("Kit")).await.unwrap();
    store.upsert_component(&record(kit.id, "inputs", "kept")).await.unwrap();
    store.close().await;

    let reopened = SqliteStore::open(&config).await.unwrap();
    let stored = reopened.get_component(kit.id, "Button").await.unwrap().unwrap();
    assert_eq!(stored.metadata["description"], "kept");
}
