//! Core data models that flow through the ingestion pipeline.
//!
//! [`RawExtraction`] is what the extraction call hands back, [`Ats`] is the
//! validated specification, and [`CatalogRecord`] is what gets upserted.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Absolute path to one candidate component source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentFileRef(PathBuf);

impl ComponentFileRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn into_path(self) -> PathBuf {
        self.0
    }
}

impl fmt::Display for ComponentFileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Untrusted field-wise output of the extraction call.
///
/// The four composite fields carry JSON documents encoded as strings.
/// Decoding never fails on field shape: missing keys and `null` become
/// empty strings and any other non-string value is kept as its JSON text,
/// so that the validator, not the envelope decoder, reports them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawExtraction {
    #[serde(deserialize_with = "lenient_string")]
    pub component_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    /// JSON array of external package names.
    #[serde(deserialize_with = "lenient_string")]
    pub dependencies: String,
    /// JSON array of alias-based internal imports.
    #[serde(deserialize_with = "lenient_string")]
    pub internal_dependencies: String,
    /// JSON object of prop name → prop details.
    #[serde(deserialize_with = "lenient_string")]
    pub props_interface: String,
    /// JSON array of keywords.
    #[serde(deserialize_with = "lenient_string")]
    pub tags: String,
    #[serde(deserialize_with = "lenient_string")]
    pub raw_code: String,
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

/// One named prop of a UI component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropDetail {
    #[serde(rename = "type")]
    pub ty: String,
    pub is_optional: bool,
    pub options: Option<Vec<String>>,
}

/// Abstract Technical Specification of a UI component.
///
/// Serializes to the camelCase JSON object stored as catalog metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ats {
    pub component_name: String,
    pub description: String,
    pub dependencies: Vec<String>,
    pub internal_dependencies: Vec<String>,
    pub props_interface: BTreeMap<String, PropDetail>,
    pub tags: Vec<String>,
    pub raw_code: String,
}

/// Persistence-ready component row. `(kit_id, name)` is the natural key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogRecord {
    pub kit_id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub metadata: serde_json::Value,
    pub embedding: Option<Vec<f32>>,
}

impl CatalogRecord {
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// Parent grouping of components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignKit {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub personality_tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Request to create a design kit. Kit names are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewDesignKit {
    pub name: String,
    pub description: Option<String>,
    pub personality_tags: Vec<String>,
}

impl NewDesignKit {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn into_kit(self) -> DesignKit {
        DesignKit {
            id: Uuid::new_v4(),
            name: self.name,
            description: self.description,
            personality_tags: self.personality_tags,
            created_at: Utc::now(),
        }
    }
}

/// A component as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredComponent {
    pub id: Uuid,
    pub kit_id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub metadata: serde_json::Value,
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_extraction_missing_keys_default_to_empty() {
        let raw: RawExtraction =
            serde_json::from_str(r#"{"componentName": "Button", "tags": "[]"}"#).unwrap();
        assert_eq!(raw.component_name, "Button");
        assert_eq!(raw.tags, "[]");
        assert!(raw.props_interface.is_empty());
    }

    #[test]
    fn raw_extraction_keeps_non_string_fields_as_json_text() {
        let raw: RawExtraction = serde_json::from_value(serde_json::json!({
            "componentName": "Button",
            "dependencies": ["react", "clsx"],
            "propsInterface": {"size": {"type": "string"}},
            "tags": null,
            "rawCode": 42
        }))
        .unwrap();

        assert_eq!(raw.dependencies, r#"["react","clsx"]"#);
        assert_eq!(raw.props_interface, r#"{"size":{"type":"string"}}"#);
        assert_eq!(raw.tags, "");
        assert_eq!(raw.raw_code, "42");
        assert_eq!(raw.internal_dependencies, "");
    }

    #[test]
    fn ats_serializes_camel_case_with_null_options() {
        let mut props = BTreeMap::new();
        props.insert(
            "label".to_string(),
            PropDetail {
                ty: "string".to_string(),
                is_optional: false,
                options: None,
            },
        );
        let ats = Ats {
            component_name: "Badge".to_string(),
            description: "A small status label.".to_string(),
            dependencies: vec!["react".to_string()],
            internal_dependencies: vec![],
            props_interface: props,
            tags: vec!["badge".to_string()],
            raw_code: "export const Badge = () => null;".to_string(),
        };

        let value = serde_json::to_value(&ats).unwrap();
        assert_eq!(value["componentName"], "Badge");
        assert_eq!(value["internalDependencies"], serde_json::json!([]));
        assert_eq!(value["propsInterface"]["label"]["type"], "string");
        assert_eq!(value["propsInterface"]["label"]["isOptional"], false);
        assert!(value["propsInterface"]["label"]["options"].is_null());
        assert_eq!(value["rawCode"], "export const Badge = () => null;");
    }
}
