//! # Kit Catalog Core
//!
//! Shared, I/O-free logic for Kit Catalog: the ATS data model, the
//! untrusted-to-typed validation boundary, the record transformer, the
//! catalog store abstraction, and the idempotent upload step.
//!
//! This crate contains no tokio runtime, sqlx, HTTP client, or filesystem
//! access. Concrete extractors, embedding providers, and stores live in
//! the `kit-catalog` app crate and plug in through the traits here.
//!
//! ## Pipeline
//!
//! ```text
//! RawExtraction ──validate──▶ Ats ──transform──▶ CatalogRecord ──upload──▶ CatalogStore
//!   (untrusted)              (typed)            (kit_id, name)            (upsert)
//! ```

pub mod embedding;
pub mod error;
pub mod extract;
pub mod models;
pub mod store;
pub mod transform;
pub mod upload;
pub mod validate;

pub use error::{IngestError, Result};
