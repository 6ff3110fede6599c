//! The structured-extraction collaborator.
//!
//! An [`Extractor`] turns component source text into a [`RawExtraction`].
//! Implementations request exactly the seven ATS fields, with the four
//! composite fields encoded as JSON strings, and must not correct the
//! model's output: that is [`validate`](crate::validate::validate)'s job.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::RawExtraction;

/// Field set every extractor must request, in response order.
pub const ATS_FIELDS: [&str; 7] = [
    "componentName",
    "description",
    "dependencies",
    "internalDependencies",
    "propsInterface",
    "tags",
    "rawCode",
];

#[async_trait]
pub trait Extractor: Send + Sync {
    /// Model or backend identifier, for logs.
    fn name(&self) -> &str;

    /// Run one extraction call over the full source text.
    async fn extract(&self, source_text: &str) -> Result<RawExtraction>;
}
