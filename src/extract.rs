//! Gemini-backed structured extraction.
//!
//! Sends a component's source to the Gemini `generateContent` endpoint
//! with a response schema that requests exactly the seven ATS fields as
//! strings, and decodes the JSON reply into a [`RawExtraction`].
//!
//! No retry happens here: one call per file. Transient failures surface
//! as errors and the pipeline driver decides whether to try the file again.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::ExtractionConfig;
use kit_catalog_core::extract::{Extractor, ATS_FIELDS};
use kit_catalog_core::models::RawExtraction;

const SYSTEM_INSTRUCTION: &str = "Analyze the React component source code and extract its \
Abstract Technical Specification (ATS) into structured fields. Respond with a single JSON \
object containing exactly the requested fields and no surrounding prose or code fences.";

/// Per-field guidance sent in the response schema, keyed like [`ATS_FIELDS`].
fn field_description(field: &str) -> &'static str {
    match field {
        "componentName" => "The exact exported name of the React component (e.g. 'Button').",
        "description" => "A concise, one-sentence summary of the component's primary function.",
        "dependencies" => {
            "A JSON-formatted list of all external package names imported \
             (e.g. [\"react\", \"@radix-ui/react-slot\"])."
        }
        "internalDependencies" => {
            "A JSON-formatted list of all internal, alias-based imports (e.g. [\"@/lib/utils\"])."
        }
        "propsInterface" => {
            "A JSON-formatted object detailing each prop. For each prop, include its \"type\", \
             \"optional\" (boolean), and \"options\" (list of strings) if defined in a cva function."
        }
        "tags" => {
            "A JSON-formatted list of 3-5 relevant, lowercase keywords \
             (e.g. [\"button\", \"ui\", \"interaction\"])."
        }
        "rawCode" => "The complete, unmodified source code from the input.",
        _ => "",
    }
}

/// Extractor calling the Gemini REST API.
pub struct GeminiExtractor {
    client: reqwest::Client,
    model: String,
    base_url: String,
    api_key: String,
    temperature: f32,
}

impl GeminiExtractor {
    /// Build from config, reading the API key from `config.api_key_env`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key variable is unset or empty.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .with_context(|| format!("{} environment variable not set", config.api_key_env))?;
        Self::new(config, api_key)
    }

    pub fn new(config: &ExtractionConfig, api_key: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            bail!("Gemini API key is required");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            temperature: config.temperature,
        })
    }

    fn request_body(&self, source_text: &str) -> Value {
        let properties: serde_json::Map<String, Value> = ATS_FIELDS
            .iter()
            .map(|field| {
                (
                    field.to_string(),
                    json!({"type": "STRING", "description": field_description(field)}),
                )
            })
            .collect();

        json!({
            "systemInstruction": {"parts": [{"text": SYSTEM_INSTRUCTION}]},
            "contents": [{
                "role": "user",
                "parts": [{"text": source_text}]
            }],
            "generationConfig": {
                "temperature": self.temperature,
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": properties,
                    "required": ATS_FIELDS,
                    "propertyOrdering": ATS_FIELDS,
                }
            }
        })
    }
}

#[async_trait]
impl Extractor for GeminiExtractor {
    fn name(&self) -> &str {
        &self.model
    }

    async fn extract(&self, source_text: &str) -> Result<RawExtraction> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(source_text))
            .send()
            .await
            .context("Failed to send request to Gemini API")?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Gemini API error {}: {}", status, body_text);
        }

        let json: Value = response
            .json()
            .await
            .context("Failed to parse Gemini API response")?;

        parse_gemini_response(&json)
    }
}

/// Pull the model's JSON text out of a `generateContent` response and
/// decode it into the raw, still-untrusted field set.
fn parse_gemini_response(json: &Value) -> Result<RawExtraction> {
    let text = json
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            let reason = json
                .pointer("/candidates/0/finishReason")
                .and_then(Value::as_str)
                .unwrap_or("no candidates");
            anyhow::anyhow!("Gemini response has no text part ({})", reason)
        })?;

    let value: Value =
        serde_json::from_str(text).context("Gemini response text is not JSON")?;
    if !value.is_object() {
        bail!("Gemini response text is not a JSON object");
    }
    serde_json::from_value(value).context("Gemini response does not carry the ATS fields")
}
