//! Ingestion pipeline orchestration.
//!
//! Coordinates the per-file flow: generation → validation → transform →
//! embedding → upsert. Each file is processed in isolation: a failure at
//! any stage is recorded against that file, logged, and the batch moves on.
//!
//! # Retry
//!
//! Transient failures ([`IngestError::is_transient`]) are retried per file
//! up to `max_attempts` with exponential backoff from `retry_backoff`.
//! Deterministic failures (bad source, schema or key violations, missing
//! kit) fail on the first attempt.
//!
//! # Embedding
//!
//! Embedding is inline and non-fatal: when the provider fails or returns a
//! vector of the wrong length, the component is stored without a vector.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::discovery::Discovery;
use crate::embedding::{create_provider, embed_one, EmbeddingProvider};
use crate::extract::GeminiExtractor;
use crate::generate::Generator;
use crate::sqlite_store::SqliteStore;
use kit_catalog_core::extract::Extractor;
use kit_catalog_core::models::{Ats, ComponentFileRef, NewDesignKit};
use kit_catalog_core::store::memory::InMemoryStore;
use kit_catalog_core::store::CatalogStore;
use kit_catalog_core::transform::transform;
use kit_catalog_core::upload::Uploader;
use kit_catalog_core::validate::validate;
use kit_catalog_core::IngestError;

/// Per-run settings for [`Pipeline`].
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Parent design kit for every component in the run.
    pub kit_id: Uuid,
    pub category: Option<String>,
    pub max_attempts: u32,
    pub retry_backoff: Duration,
}

impl IngestOptions {
    /// Single attempt per file, no category.
    pub fn new(kit_id: Uuid) -> Self {
        Self {
            kit_id,
            category: None,
            max_attempts: 1,
            retry_backoff: Duration::from_millis(1000),
        }
    }

    pub fn from_config(config: &Config, kit_id: Uuid, category: Option<String>) -> Self {
        Self {
            kit_id,
            category,
            max_attempts: config.pipeline.max_attempts,
            retry_backoff: config.pipeline.retry_backoff(),
        }
    }
}

/// A component that made it into the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedComponent {
    pub id: Uuid,
    pub kit_id: Uuid,
    pub name: String,
    pub embedded: bool,
}

/// What happened to one discovered file.
#[derive(Debug)]
pub struct ItemOutcome {
    pub path: PathBuf,
    pub result: std::result::Result<IngestedComponent, IngestError>,
}

/// Per-item results of a batch, in input order.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub outcomes: Vec<ItemOutcome>,
}

impl IngestReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded()
    }

    pub fn embedded(&self) -> usize {
        self.successes().filter(|c| c.embedded).count()
    }

    pub fn successes(&self) -> impl Iterator<Item = &IngestedComponent> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Path, &IngestError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.path.as_path(), e)))
    }

    /// Non-empty input with nothing stored.
    pub fn is_total_failure(&self) -> bool {
        self.attempted() > 0 && self.succeeded() == 0
    }
}

/// Runs the stage chain over a batch of component files.
pub struct Pipeline {
    generator: Generator,
    uploader: Uploader,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    options: IngestOptions,
}

impl Pipeline {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        store: Arc<dyn CatalogStore>,
        options: IngestOptions,
    ) -> Self {
        Self {
            generator: Generator::new(extractor),
            uploader: Uploader::new(store),
            embedder: None,
            options,
        }
    }

    pub fn with_embedder(mut self, embedder: Option<Arc<dyn EmbeddingProvider>>) -> Self {
        self.embedder = embedder;
        self
    }

    /// Process every file in order. Never fails as a whole.
    pub async fn run(&self, files: &[ComponentFileRef]) -> IngestReport {
        let mut report = IngestReport::default();

        for (index, file) in files.iter().enumerate() {
            debug!(path = %file, item = index + 1, total = files.len(), "processing component");
            let result = self.process(file).await;

            if let Err(ref e) = result {
                warn!(path = %file, kind = e.kind(), error = %e, "skipping component");
            }

            report.outcomes.push(ItemOutcome {
                path: file.path().to_path_buf(),
                result,
            });
        }

        info!(
            attempted = report.attempted(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            "ingestion finished"
        );
        report
    }

    /// Process one file, retrying transient failures.
    pub async fn process(
        &self,
        file: &ComponentFileRef,
    ) -> std::result::Result<IngestedComponent, IngestError> {
        let max_attempts = self.options.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.process_once(file).await {
                Ok(done) => return Ok(done),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = retry_delay(self.options.retry_backoff, attempt);
                    warn!(
                        path = %file,
                        kind = e.kind(),
                        error = %e,
                        attempt,
                        ?delay,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn process_once(
        &self,
        file: &ComponentFileRef,
    ) -> std::result::Result<IngestedComponent, IngestError> {
        let raw = self.generator.generate(file).await?;
        let ats = validate(&raw)?;
        let mut record = transform(
            &ats,
            &self.options.kit_id.to_string(),
            self.options.category.as_deref(),
        )?;

        if let Some(vector) = self.embed(file, &ats).await {
            record = record.with_embedding(vector);
        }
        let embedded = record.embedding.is_some();

        let id = self.uploader.upsert(&record).await?;
        Ok(IngestedComponent {
            id,
            kit_id: record.kit_id,
            name: record.name,
            embedded,
        })
    }

    async fn embed(&self, file: &ComponentFileRef, ats: &Ats) -> Option<Vec<f32>> {
        let provider = self.embedder.as_deref()?;
        let text = if ats.description.trim().is_empty() {
            &ats.component_name
        } else {
            &ats.description
        };

        match embed_one(provider, text).await {
            Ok(vector) if vector.len() == provider.dims() => Some(vector),
            Ok(vector) => {
                warn!(
                    path = %file,
                    expected = provider.dims(),
                    actual = vector.len(),
                    "embedding has wrong dimensions, storing without vector"
                );
                None
            }
            Err(e) => {
                warn!(path = %file, error = %format!("{:#}", e), "embedding failed, storing without vector");
                None
            }
        }
    }
}

/// How `ingest` picks the parent kit.
#[derive(Debug, Clone)]
pub enum KitSelector {
    /// An existing kit; the run fails if it is missing.
    Id(Uuid),
    /// A kit looked up by name and created if absent.
    Name(String),
}

async fn resolve_kit(store: &dyn CatalogStore, selector: &KitSelector) -> Result<Uuid> {
    match selector {
        KitSelector::Id(id) => match store.get_kit(*id).await? {
            Some(kit) => Ok(kit.id),
            None => bail!("Design kit {} does not exist", id),
        },
        KitSelector::Name(name) => {
            let kit = store.ensure_kit(&NewDesignKit::named(name.clone())).await?;
            Ok(kit.id)
        }
    }
}

/// Name of the kit a dry run stages into. The database is only read, and
/// only when an existing kit is selected by id.
async fn dry_run_kit_name(config: &Config, selector: &KitSelector) -> Result<String> {
    match selector {
        KitSelector::Name(name) => Ok(name.clone()),
        KitSelector::Id(id) => {
            if !config.db.path.exists() {
                bail!("Design kit {} does not exist", id);
            }
            let sqlite = SqliteStore::open_read_only(config).await?;
            let found = sqlite.get_kit(*id).await;
            sqlite.close().await;
            match found? {
                Some(existing) => Ok(existing.name),
                None => bail!("Design kit {} does not exist", id),
            }
        }
    }
}

/// CLI entry point for `kitc ingest`.
///
/// With `dry_run`, components are generated and validated but written to a
/// throwaway in-memory catalog. The database is never created or modified.
pub async fn run_ingest(
    config: &Config,
    path: &Path,
    kit: &KitSelector,
    category: Option<String>,
    dry_run: bool,
) -> Result<IngestReport> {
    let discovery = Discovery::new(&config.discovery).context("Invalid discovery config")?;
    let files = discovery.discover(path);

    let (store, kit_id): (Arc<dyn CatalogStore>, Uuid) = if dry_run {
        let memory = InMemoryStore::new();
        let name = dry_run_kit_name(config, kit).await?;
        let kit = memory.ensure_kit(&NewDesignKit::named(name)).await?;
        (Arc::new(memory), kit.id)
    } else {
        let sqlite = SqliteStore::open(config).await?;
        let kit_id = resolve_kit(&sqlite, kit).await?;
        (Arc::new(sqlite), kit_id)
    };

    let report = if files.is_empty() {
        IngestReport::default()
    } else {
        let extractor = GeminiExtractor::from_config(&config.extraction)?;
        let embedder = create_provider(&config.embedding)?;
        let options = IngestOptions::from_config(config, kit_id, category);
        Pipeline::new(Arc::new(extractor), store, options)
            .with_embedder(embedder)
            .run(&files)
            .await
    };

    println!("Ingest {}", path.display());
    println!("  kit: {}", kit_id);
    println!("  attempted: {}", report.attempted());
    println!("  succeeded: {}", report.succeeded());
    println!("  failed: {}", report.failed());
    println!("  embedded: {}", report.embedded());
    if dry_run {
        println!("  dry run: nothing written");
    }
    for (failed_path, error) in report.failures() {
        println!("  - {} [{}]", failed_path.display(), error.kind());
    }
    if !report.is_total_failure() {
        println!("ok");
    }

    Ok(report)
}

/// Backoff before retry number `attempt`: `base·2^(attempt-1)`, doubling at
/// most five times and saturating instead of overflowing.
fn retry_delay(base: Duration, attempt: u32) -> Duration {
    base.checked_mul(1u32 << attempt.saturating_sub(1).min(5))
        .unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(ok: bool, embedded: bool) -> ItemOutcome {
        ItemOutcome {
            path: PathBuf::from("/ui/Button.tsx"),
            result: if ok {
                Ok(IngestedComponent {
                    id: Uuid::new_v4(),
                    kit_id: Uuid::new_v4(),
                    name: "Button".to_string(),
                    embedded,
                })
            } else {
                Err(IngestError::generation("boom"))
            },
        }
    }

    #[test]
    fn report_counts() {
        let report = IngestReport {
            outcomes: vec![outcome(true, true), outcome(false, false), outcome(true, false)],
        };
        assert_eq!(report.attempted(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.embedded(), 1);
        assert_eq!(report.failures().count(), 1);
        assert!(!report.is_total_failure());
    }

    #[test]
    fn exit_policy_needs_non_empty_input() {
        assert!(!IngestReport::default().is_total_failure());
        let all_failed = IngestReport {
            outcomes: vec![outcome(false, false)],
        };
        assert!(all_failed.is_total_failure());
    }

    #[test]
    fn retry_delay_doubles_then_caps() {
        let base = Duration::from_millis(100);
        assert_eq!(retry_delay(base, 1), Duration::from_millis(100));
        assert_eq!(retry_delay(base, 2), Duration::from_millis(200));
        assert_eq!(retry_delay(base, 6), Duration::from_millis(3200));
        assert_eq!(retry_delay(base, 40), Duration::from_millis(3200));
    }

    #[test]
    fn retry_delay_saturates_on_huge_backoff() {
        let base = Duration::from_millis(u64::MAX);
        assert_eq!(retry_delay(base, 1), base);
        assert_eq!(retry_delay(base, 3), Duration::MAX);
    }
}
