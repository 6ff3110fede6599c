//! # Kit Catalog
//!
//! Ingests UI component source files into a catalog of structured,
//! searchable component specifications grouped by design kit.
//!
//! For every `.tsx` / `.jsx` file found under a path, an LLM extraction call
//! produces an Abstract Technical Specification (ATS): name, description,
//! external and internal dependencies, props interface, tags, and raw code.
//! The ATS is validated, mapped to a catalog record, optionally embedded,
//! and upserted by `(kit_id, name)`.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌───────────┐   ┌───────────────────┐   ┌──────────┐
//! │ Discovery │──▶│ Generator │──▶│ Validate/Transform│──▶│ Uploader │
//! │ walkdir   │   │ Gemini    │   │ + embedding       │   │ SQLite   │
//! └───────────┘   └───────────┘   └───────────────────┘   └──────────┘
//! ```
//!
//! Validation, transformation, upload, and the collaborator traits live in
//! the `kit-catalog-core` crate; this crate provides the concrete
//! backends and the `kitc` CLI.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`discovery`] | Component file discovery |
//! | [`generate`] | Read a file and run one extraction |
//! | [`extract`] | Gemini structured-extraction client |
//! | [`embedding`] | Embedding providers |
//! | [`ingest`] | Pipeline driver and `kitc ingest` |
//! | [`sqlite_store`] | SQLite catalog store |
//! | [`catalog`] | Kit and component commands |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod catalog;
pub mod config;
pub mod db;
pub mod discovery;
pub mod embedding;
pub mod extract;
pub mod generate;
pub mod ingest;
pub mod migrate;
pub mod sqlite_store;
