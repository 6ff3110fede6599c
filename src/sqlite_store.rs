//! SQLite implementation of the catalog store.
//!
//! Kits and components live in the `design_kits` and `components` tables
//! created by [`migrate`](crate::migrate). IDs are stored as hyphenated
//! UUID text, timestamps as Unix seconds, and embeddings as little-endian
//! `f32` blobs alongside their dimension count.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{Sqlite, SqliteRow};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::config::Config;
use crate::db;
use crate::migrate;
use kit_catalog_core::embedding::{blob_to_vec, vec_to_blob};
use kit_catalog_core::models::{CatalogRecord, DesignKit, NewDesignKit, StoredComponent};
use kit_catalog_core::store::CatalogStore;
use kit_catalog_core::IngestError;

const COMPONENT_COLUMNS: &str =
    "id, kit_id, name, category, metadata_json, embedding, created_at, updated_at";

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect using `config.db` and make sure the schema exists.
    pub async fn open(config: &Config) -> anyhow::Result<Self> {
        let pool = db::connect(config).await?;
        migrate::apply(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Connect to an existing catalog for lookups only.
    pub async fn open_read_only(config: &Config) -> anyhow::Result<Self> {
        let pool = db::connect_read_only(config).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> IngestError {
    move |e| IngestError::persistence(context, e)
}

fn parse_uuid(text: &str) -> kit_catalog_core::Result<Uuid> {
    Uuid::parse_str(text).map_err(|e| IngestError::persistence("stored id is not a UUID", e))
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> kit_catalog_core::Result<T>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(name)
        .map_err(|e| IngestError::persistence(format!("failed to decode column '{}'", name), e))
}

fn kit_from_row(row: &SqliteRow) -> kit_catalog_core::Result<DesignKit> {
    let tags: String = column(row, "personality_tags")?;
    let personality_tags = serde_json::from_str(&tags)
        .map_err(|e| IngestError::persistence("stored personality_tags are not a JSON list", e))?;
    let id: String = column(row, "id")?;

    Ok(DesignKit {
        id: parse_uuid(&id)?,
        name: column(row, "name")?,
        description: column(row, "description")?,
        personality_tags,
        created_at: timestamp(column(row, "created_at")?),
    })
}

fn component_from_row(row: &SqliteRow) -> kit_catalog_core::Result<StoredComponent> {
    let metadata_json: String = column(row, "metadata_json")?;
    let metadata = serde_json::from_str(&metadata_json)
        .map_err(|e| IngestError::persistence("stored metadata is not JSON", e))?;
    let embedding: Option<Vec<u8>> = column(row, "embedding")?;
    let id: String = column(row, "id")?;
    let kit_id: String = column(row, "kit_id")?;

    Ok(StoredComponent {
        id: parse_uuid(&id)?,
        kit_id: parse_uuid(&kit_id)?,
        name: column(row, "name")?,
        category: column(row, "category")?,
        metadata,
        embedding: embedding.map(|blob| blob_to_vec(&blob)),
        created_at: timestamp(column(row, "created_at")?),
        updated_at: timestamp(column(row, "updated_at")?),
    })
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn get_kit(&self, id: Uuid) -> kit_catalog_core::Result<Option<DesignKit>> {
        let row = sqlx::query(
            "SELECT id, name, description, personality_tags, created_at FROM design_kits WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("failed to load design kit"))?;

        row.as_ref().map(kit_from_row).transpose()
    }

    async fn find_kit_by_name(&self, name: &str) -> kit_catalog_core::Result<Option<DesignKit>> {
        let row = sqlx::query(
            "SELECT id, name, description, personality_tags, created_at FROM design_kits WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("failed to look up design kit"))?;

        row.as_ref().map(kit_from_row).transpose()
    }

    async fn ensure_kit(&self, kit: &NewDesignKit) -> kit_catalog_core::Result<DesignKit> {
        let candidate = kit.clone().into_kit();
        let tags = serde_json::to_string(&candidate.personality_tags)
            .map_err(|e| IngestError::persistence("failed to encode personality_tags", e))?;

        sqlx::query(
            r#"
            INSERT INTO design_kits (id, name, description, personality_tags, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(name) DO NOTHING
            "#,
        )
        .bind(candidate.id.to_string())
        .bind(&candidate.name)
        .bind(&candidate.description)
        .bind(tags)
        .bind(candidate.created_at.timestamp())
        .execute(&self.pool)
        .await
        .map_err(db_error("failed to create design kit"))?;

        self.find_kit_by_name(&kit.name)
            .await?
            .ok_or_else(|| IngestError::Persistence {
                message: format!("design kit '{}' missing after insert", kit.name),
                source: None,
            })
    }

    async fn list_kits(&self) -> kit_catalog_core::Result<Vec<DesignKit>> {
        let rows = sqlx::query(
            "SELECT id, name, description, personality_tags, created_at FROM design_kits ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("failed to list design kits"))?;

        rows.iter().map(kit_from_row).collect()
    }

    async fn upsert_component(&self, record: &CatalogRecord) -> kit_catalog_core::Result<Uuid> {
        let now = Utc::now().timestamp();
        let metadata_json = serde_json::to_string(&record.metadata)
            .map_err(|e| IngestError::persistence("failed to encode metadata", e))?;
        let blob = record.embedding.as_deref().map(vec_to_blob);
        let dims = record.embedding.as_ref().map(|v| v.len() as i64);

        // On conflict the existing id and created_at are kept.
        let result = sqlx::query_scalar::<_, String>(
            r#"
            INSERT INTO components (id, kit_id, name, category, metadata_json, embedding, embedding_dims, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(kit_id, name) DO UPDATE SET
                category = excluded.category,
                metadata_json = excluded.metadata_json,
                embedding = excluded.embedding,
                embedding_dims = excluded.embedding_dims,
                updated_at = excluded.updated_at
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(record.kit_id.to_string())
        .bind(&record.name)
        .bind(&record.category)
        .bind(metadata_json)
        .bind(blob)
        .bind(dims)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(id) => parse_uuid(&id),
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
                Err(IngestError::Referential {
                    kit_id: record.kit_id,
                })
            }
            Err(e) => Err(IngestError::persistence("failed to upsert component", e)),
        }
    }

    async fn get_component(
        &self,
        kit_id: Uuid,
        name: &str,
    ) -> kit_catalog_core::Result<Option<StoredComponent>> {
        let sql = format!(
            "SELECT {} FROM components WHERE kit_id = ? AND name = ?",
            COMPONENT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(kit_id.to_string())
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("failed to load component"))?;

        row.as_ref().map(component_from_row).transpose()
    }

    async fn list_components(&self, kit_id: Uuid) -> kit_catalog_core::Result<Vec<StoredComponent>> {
        let sql = format!(
            "SELECT {} FROM components WHERE kit_id = ? ORDER BY name",
            COMPONENT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(kit_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("failed to list components"))?;

        rows.iter().map(component_from_row).collect()
    }
}
