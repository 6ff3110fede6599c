//! Error types for the ingestion pipeline.
//!
//! Every stage returns [`IngestError`]. Each variant is local to a single
//! component file: the pipeline driver records it against the file and
//! moves on to the next one.

use std::path::PathBuf;

use uuid::Uuid;

/// Boxed cause carried by [`IngestError::Persistence`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A stage-level failure for one component file.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The component source file could not be read.
    #[error("cannot read {path:?}: {source}")]
    FileAccess {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The extraction call failed or returned an undecodable envelope.
    #[error("extraction failed: {message}")]
    Generation { message: String },

    /// The extraction output broke the ATS schema.
    #[error("schema violation in '{field}': {message}")]
    SchemaViolation { field: String, message: String },

    /// A validated ATS could not be mapped to a catalog record.
    #[error("invalid '{field}': {message}")]
    Validation { field: String, message: String },

    /// The referenced design kit does not exist.
    #[error("design kit {kit_id} does not exist")]
    Referential { kit_id: Uuid },

    /// The catalog store rejected or failed the operation.
    #[error("persistence error: {message}")]
    Persistence {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

/// Convenience alias used throughout the core.
pub type Result<T> = std::result::Result<T, IngestError>;

impl IngestError {
    pub fn schema(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaViolation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    /// Wrap a store-level failure, keeping the cause for diagnostics.
    pub fn persistence<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Persistence {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Stable label used in structured log events.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FileAccess { .. } => "file_access",
            Self::Generation { .. } => "generation",
            Self::SchemaViolation { .. } => "schema_violation",
            Self::Validation { .. } => "validation",
            Self::Referential { .. } => "referential",
            Self::Persistence { .. } => "persistence",
        }
    }

    /// Whether retrying the same file could plausibly succeed.
    ///
    /// Only failures of the two external calls (extraction and store)
    /// qualify; everything else is deterministic for a given input.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Generation { .. } | Self::Persistence { .. })
    }
}
