//! Postprocessing of fetched artifacts: extraction, then an optional rename.
//!
//! Extraction is picked by [`ArchiveKind::from_file_name`] and delegated to an
//! [`Extractor`]. Extraction failures fail the artifact; rename failures are
//! logged and reported in [`PostprocessReport`] only.

mod archive;
mod error;
mod extract;
mod rename;

pub use archive::ArchiveKind;
pub use error::PostprocessError;
pub use extract::{CommandExtractor, Extractor};
pub use rename::{RenameOutcome, apply_rename};

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::artifact::RenamePair;

/// What postprocessing did for one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostprocessReport {
    /// Archive kind that was extracted, if any.
    pub extracted: Option<ArchiveKind>,
    /// Rename result, if a rename pair was declared.
    pub rename: Option<RenameOutcome>,
}

/// Runs extraction and rename for fetched artifacts.
#[derive(Clone)]
pub struct Postprocessor {
    extractor: Arc<dyn Extractor>,
}

impl Postprocessor {
    /// Creates a postprocessor backed by `extractor`.
    #[must_use]
    pub fn new(extractor: Arc<dyn Extractor>) -> Self {
        Self { extractor }
    }

    /// Extracts `target_name` in `work_dir` if it is an archive, then applies
    /// `rename`.
    ///
    /// # Errors
    ///
    /// Returns [`PostprocessError`] if extraction fails. Rename failures are
    /// returned inside the report.
    #[tracing::instrument(skip(self, work_dir, rename))]
    pub async fn process(
        &self,
        work_dir: &Path,
        target_name: &str,
        rename: Option<&RenamePair>,
    ) -> Result<PostprocessReport, PostprocessError> {
        let extracted = ArchiveKind::from_file_name(target_name);
        match extracted {
            Some(kind) => self.extractor.extract(kind, target_name, work_dir).await?,
            None => debug!(target_name, "Not an archive, leaving as-is"),
        }

        let rename = match rename {
            Some(pair) => Some(apply_rename(work_dir, pair).await),
            None => None,
        };

        Ok(PostprocessReport { extracted, rename })
    }
}

impl Default for Postprocessor {
    fn default() -> Self {
        Self::new(Arc::new(CommandExtractor::new()))
    }
}

impl std::fmt::Debug for Postprocessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Postprocessor").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingExtractor {
        calls: Mutex<Vec<(ArchiveKind, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl Extractor for RecordingExtractor {
        async fn extract(
            &self,
            kind: ArchiveKind,
            archive: &str,
            work_dir: &Path,
        ) -> Result<(), PostprocessError> {
            self.calls.lock().unwrap().push((kind, archive.to_string()));
            if self.fail {
                return Err(PostprocessError::extraction(archive, "fake", "exit status: 1"));
            }
            // Produce what the real archive would.
            std::fs::create_dir_all(work_dir.join("unpacked")).unwrap();
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_process_dispatches_by_extension() {
        let work = TempDir::new().unwrap();
        let extractor = Arc::new(RecordingExtractor::default());
        let postprocessor = Postprocessor::new(extractor.clone());

        for name in ["file.zip", "file.tar.gz", "file.jar", "file.tar.bz2"] {
            postprocessor.process(work.path(), name, None).await.unwrap();
        }

        let calls = extractor.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                (ArchiveKind::Zip, "file.zip".to_string()),
                (ArchiveKind::GzipTar, "file.tar.gz".to_string()),
                (ArchiveKind::Bzip2Tar, "file.tar.bz2".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_process_non_archive_reports_nothing_extracted() {
        let work = TempDir::new().unwrap();
        let postprocessor = Postprocessor::new(Arc::new(RecordingExtractor::default()));
        let report = postprocessor
            .process(work.path(), "selenium-server.jar", None)
            .await
            .unwrap();
        assert_eq!(
            report,
            PostprocessReport {
                extracted: None,
                rename: None
            }
        );
    }

    #[tokio::test]
    async fn test_process_rename_failure_still_succeeds() {
        let work = TempDir::new().unwrap();
        let postprocessor = Postprocessor::new(Arc::new(RecordingExtractor::default()));
        let pair = RenamePair::new("not-what-the-archive-made", "driver");

        let report = postprocessor
            .process(work.path(), "driver.zip", Some(&pair))
            .await
            .unwrap();

        assert_eq!(report.extracted, Some(ArchiveKind::Zip));
        assert!(matches!(report.rename, Some(RenameOutcome::Failed { .. })));
    }

    #[tokio::test]
    async fn test_process_renames_extracted_entry() {
        let work = TempDir::new().unwrap();
        let postprocessor = Postprocessor::new(Arc::new(RecordingExtractor::default()));
        let pair = RenamePair::new("unpacked", "renamed");

        let report = postprocessor
            .process(work.path(), "bundle.tar.gz", Some(&pair))
            .await
            .unwrap();

        assert_eq!(report.rename, Some(RenameOutcome::Renamed));
        assert!(work.path().join("renamed").is_dir());
    }

    #[tokio::test]
    async fn test_process_extraction_failure_is_fatal() {
        let work = TempDir::new().unwrap();
        let extractor = RecordingExtractor {
            fail: true,
            ..RecordingExtractor::default()
        };
        let postprocessor = Postprocessor::new(Arc::new(extractor));
        let pair = RenamePair::new("a", "b");

        let result = postprocessor
            .process(work.path(), "broken.zip", Some(&pair))
            .await;
        assert!(matches!(result, Err(PostprocessError::Extraction { .. })));
    }
}
