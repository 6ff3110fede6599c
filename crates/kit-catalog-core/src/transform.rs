//! ATS → catalog record mapping.
//!
//! The full ATS is embedded as an opaque `metadata` blob instead of being
//! projected into store columns, so the store schema does not change when
//! ATS fields do.

use uuid::Uuid;

use crate::error::IngestError;
use crate::models::{Ats, CatalogRecord};

/// Map a validated ATS plus ownership context into a [`CatalogRecord`].
///
/// Re-checks the identity fields (`componentName`, `kit_id`) and that the
/// ATS serializes to a JSON object. The returned record has no embedding;
/// attach one with [`CatalogRecord::with_embedding`].
pub fn transform(ats: &Ats, kit_id: &str, category: Option<&str>) -> crate::Result<CatalogRecord> {
    if ats.component_name.trim().is_empty() {
        return Err(IngestError::validation(
            "componentName",
            "ATS output is missing a component name",
        ));
    }

    let kit_id = parse_kit_id(kit_id)?;

    let metadata = serde_json::to_value(ats).map_err(|e| {
        IngestError::validation("metadata", format!("ATS is not JSON serializable: {}", e))
    })?;
    if !metadata.is_object() {
        return Err(IngestError::validation(
            "metadata",
            "ATS did not serialize to a JSON object",
        ));
    }

    let category = category
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    Ok(CatalogRecord {
        kit_id,
        name: ats.component_name.clone(),
        category,
        metadata,
        embedding: None,
    })
}

/// Parse a kit identifier, rejecting malformed and nil UUIDs.
pub fn parse_kit_id(kit_id: &str) -> crate::Result<Uuid> {
    let id = Uuid::parse_str(kit_id.trim()).map_err(|e| {
        IngestError::validation("kit_id", format!("'{}' is not a valid UUID: {}", kit_id, e))
    })?;
    if id.is_nil() {
        return Err(IngestError::validation("kit_id", "the nil UUID is not a kit"));
    }
    Ok(id)
}
