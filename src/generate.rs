//! ATS generation: one file in, one raw extraction out.

use std::sync::Arc;

use tracing::debug;

use kit_catalog_core::extract::Extractor;
use kit_catalog_core::models::{ComponentFileRef, RawExtraction};
use kit_catalog_core::IngestError;

/// Reads component sources and hands them to an [`Extractor`].
///
/// Calls the extractor exactly once per file and returns its output
/// untouched. Retry, if any, belongs to the pipeline driver.
#[derive(Clone)]
pub struct Generator {
    extractor: Arc<dyn Extractor>,
}

impl Generator {
    pub fn new(extractor: Arc<dyn Extractor>) -> Self {
        Self { extractor }
    }

    pub async fn generate(&self, file: &ComponentFileRef) -> kit_catalog_core::Result<RawExtraction> {
        let source = tokio::fs::read_to_string(file.path())
            .await
            .map_err(|source| IngestError::FileAccess {
                path: file.path().to_path_buf(),
                source,
            })?;

        debug!(
            path = %file,
            bytes = source.len(),
            extractor = self.extractor.name(),
            "requesting extraction"
        );

        self.extractor
            .extract(&source)
            .await
            .map_err(|e| IngestError::generation(format!("{:#}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Recording {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Extractor for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        async fn extract(&self, source_text: &str) -> Result<RawExtraction> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("model unavailable");
            }
            Ok(RawExtraction {
                component_name: "Echo".to_string(),
                raw_code: source_text.to_string(),
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn passes_full_text_through_once() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("Echo.tsx");
        std::fs::write(&path, "export const Echo = () => null;\n").unwrap();

        let extractor = Arc::new(Recording::default());
        let generator = Generator::new(extractor.clone());
        let raw = generator.generate(&ComponentFileRef::new(&path)).await.unwrap();

        assert_eq!(raw.raw_code, "export const Echo = () => null;\n");
        assert_eq!(raw.tags, "");
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_file_is_file_access_error() {
        let extractor = Arc::new(Recording::default());
        let generator = Generator::new(extractor.clone());
        let err = generator
            .generate(&ComponentFileRef::new("/no/such/Button.tsx"))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::FileAccess { .. }));
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn extractor_failure_is_generation_error_without_retry() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("Broken.tsx");
        std::fs::write(&path, "export {}").unwrap();

        let extractor = Arc::new(Recording {
            fail: true,
            ..Default::default()
        });
        let generator = Generator::new(extractor.clone());
        let err = generator.generate(&ComponentFileRef::new(&path)).await.unwrap_err();

        assert!(matches!(err, IngestError::Generation { ref message } if message.contains("model unavailable")));
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    }
}
