//! The untrusted → typed boundary.
//!
//! [`validate`] is the only place that decodes the JSON documents the
//! extraction call embeds in string fields. Everything downstream works
//! with the typed [`Ats`].
//!
//! # Normalization
//!
//! Each `propsInterface` entry is remapped field by field:
//!
//! | Generator key | ATS key | Rule |
//! |---------------|---------|------|
//! | `type` | `type` | required, non-empty string |
//! | `optional` | `isOptional` | boolean, defaults to `false` when absent |
//! | `options` | `options` | absent or `null` → `None`, else array of strings |
//!
//! Any other key on a prop entry is ignored.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::Value;

use crate::error::IngestError;
use crate::models::{Ats, PropDetail, RawExtraction};

const PROPS_FIELD: &str = "propsInterface";

/// Parse and normalize a raw extraction into an [`Ats`].
///
/// The four JSON-string fields are decoded independently; the first one
/// that fails is reported by name in [`IngestError::SchemaViolation`].
pub fn validate(raw: &RawExtraction) -> crate::Result<Ats> {
    if raw.component_name.trim().is_empty() {
        return Err(IngestError::schema("componentName", "missing or empty"));
    }

    let dependencies = parse_string_list("dependencies", &raw.dependencies)?;
    let internal_dependencies =
        parse_string_list("internalDependencies", &raw.internal_dependencies)?;
    let props_interface = parse_props(&raw.props_interface)?;
    let tags = parse_string_list("tags", &raw.tags)?;

    Ok(Ats {
        component_name: raw.component_name.clone(),
        description: raw.description.clone(),
        dependencies,
        internal_dependencies,
        props_interface,
        tags,
        raw_code: raw.raw_code.clone(),
    })
}

fn parse_string_list(field: &str, text: &str) -> crate::Result<Vec<String>> {
    serde_json::from_str::<Vec<String>>(text)
        .map_err(|e| IngestError::schema(field, describe_json_error(&e, "a JSON array of strings")))
}

fn describe_json_error(err: &serde_json::Error, expected: &str) -> String {
    if err.is_syntax() || err.is_eof() {
        format!("not well-formed JSON: {}", err)
    } else {
        format!("expected {}: {}", expected, err)
    }
}

fn parse_props(text: &str) -> crate::Result<BTreeMap<String, PropDetail>> {
    let PropsObject(entries) = serde_json::from_str(text)
        .map_err(|e| IngestError::schema(PROPS_FIELD, describe_json_error(&e, "a JSON object")))?;

    let mut props = BTreeMap::new();
    for (name, value) in entries {
        let detail = normalize_prop(&name, &value)?;
        props.insert(name, detail);
    }
    Ok(props)
}

fn normalize_prop(name: &str, value: &Value) -> crate::Result<PropDetail> {
    let fields = value.as_object().ok_or_else(|| {
        IngestError::schema(PROPS_FIELD, format!("prop '{}' is not an object", name))
    })?;

    let ty = match fields.get("type") {
        None => {
            return Err(IngestError::schema(
                PROPS_FIELD,
                format!("prop '{}' is missing 'type'", name),
            ))
        }
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(_) => {
            return Err(IngestError::schema(
                PROPS_FIELD,
                format!("prop '{}' has a non-string or empty 'type'", name),
            ))
        }
    };

    let is_optional = match fields.get("optional") {
        None => false,
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            return Err(IngestError::schema(
                PROPS_FIELD,
                format!("prop '{}' has non-boolean 'optional': {}", name, other),
            ))
        }
    };

    let options = match fields.get("options") {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => out.push(s.clone()),
                    other => {
                        return Err(IngestError::schema(
                            PROPS_FIELD,
                            format!("prop '{}' has a non-string option: {}", name, other),
                        ))
                    }
                }
            }
            Some(out)
        }
        Some(other) => {
            return Err(IngestError::schema(
                PROPS_FIELD,
                format!("prop '{}' has 'options' that is not a list: {}", name, other),
            ))
        }
    };

    Ok(PropDetail {
        ty,
        is_optional,
        options,
    })
}

/// JSON object decoded with duplicate keys rejected.
struct PropsObject(BTreeMap<String, Value>);

impl<'de> Deserialize<'de> for PropsObject {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PropsVisitor;

        impl<'de> Visitor<'de> for PropsVisitor {
            type Value = PropsObject;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object of prop definitions")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<PropsObject, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = BTreeMap::new();
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    if entries.contains_key(&key) {
                        return Err(de::Error::custom(format!("duplicate prop '{}'", key)));
                    }
                    entries.insert(key, value);
                }
                Ok(PropsObject(entries))
            }
        }

        deserializer.deserialize_map(PropsVisitor)
    }
}
