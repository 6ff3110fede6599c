//! Storage abstraction for the component catalog.
//!
//! The [`CatalogStore`] trait covers the two collections the pipeline
//! touches: design kits (parents) and components (children, keyed by
//! `(kit_id, name)`). Backends: [`memory::InMemoryStore`] here, SQLite in
//! the app crate.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{CatalogRecord, DesignKit, NewDesignKit, StoredComponent};

/// Abstract catalog backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get_kit`](CatalogStore::get_kit) | Look up a kit by ID |
/// | [`find_kit_by_name`](CatalogStore::find_kit_by_name) | Look up a kit by its unique name |
/// | [`ensure_kit`](CatalogStore::ensure_kit) | Return the kit with this name, creating it if absent |
/// | [`list_kits`](CatalogStore::list_kits) | All kits, by name |
/// | [`upsert_component`](CatalogStore::upsert_component) | Insert or overwrite by `(kit_id, name)` |
/// | [`get_component`](CatalogStore::get_component) | Read one component back |
/// | [`list_components`](CatalogStore::list_components) | All components of a kit, by name |
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_kit(&self, id: Uuid) -> crate::Result<Option<DesignKit>>;

    async fn find_kit_by_name(&self, name: &str) -> crate::Result<Option<DesignKit>>;

    /// Create-or-return by name. An existing kit is returned unchanged.
    async fn ensure_kit(&self, kit: &NewDesignKit) -> crate::Result<DesignKit>;

    async fn list_kits(&self) -> crate::Result<Vec<DesignKit>>;

    /// Insert a component or overwrite `category`, `metadata`, and
    /// `embedding` of the existing row with the same `(kit_id, name)`.
    ///
    /// Returns the component ID, which is stable across overwrites.
    /// Fails with [`IngestError::Referential`](crate::IngestError::Referential)
    /// when the kit does not exist.
    async fn upsert_component(&self, record: &CatalogRecord) -> crate::Result<Uuid>;

    async fn get_component(&self, kit_id: Uuid, name: &str)
        -> crate::Result<Option<StoredComponent>>;

    async fn list_components(&self, kit_id: Uuid) -> crate::Result<Vec<StoredComponent>>;
}
