//! Error types for the orchestrator.

use thiserror::Error;

use crate::artifact::DescriptorError;
use crate::download::DownloadError;
use crate::postprocess::PostprocessError;
use crate::resolver::ResolveError;

/// Why a single artifact could not be acquired.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// Locator resolution failed.
    #[error("resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    /// Fetching or verifying failed.
    #[error("{prefix}: {0}", prefix = download_prefix(.0))]
    Download(#[from] DownloadError),

    /// Extraction failed.
    #[error("extraction failed: {0}")]
    Postprocess(#[from] PostprocessError),

    /// The resolved artifact cannot be stored under a usable, unique name.
    #[error("invalid artifact: {0}")]
    Descriptor(#[from] DescriptorError),

    /// Work stopped because a sibling artifact failed.
    #[error("cancelled")]
    Cancelled,

    /// The task panicked or was torn down.
    #[error("task stopped unexpectedly: {reason}")]
    Task {
        /// Join error text.
        reason: String,
    },
}

impl AcquireError {
    /// Returns true if the task stopped only because the run was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Download(error) => error.is_cancelled(),
            _ => false,
        }
    }
}

/// One failed artifact with a human-readable label.
#[derive(Debug, Error)]
#[error("{label}: {error}")]
pub struct ArtifactFailure {
    /// Target name, or the locator when no name was known yet.
    pub label: String,
    /// What went wrong.
    #[source]
    pub error: AcquireError,
}

impl ArtifactFailure {
    /// Creates a failure record.
    pub fn new(label: impl Into<String>, error: impl Into<AcquireError>) -> Self {
        Self {
            label: label.into(),
            error: error.into(),
        }
    }
}

/// Errors returned from a run.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The descriptor set was rejected before any work started.
    #[error("invalid descriptor set: {0}")]
    Descriptor(#[from] DescriptorError),

    /// One or more artifacts failed; siblings were cancelled.
    #[error("{} artifact(s) failed:\n{}", .failures.len(), format_failures(.failures))]
    Failed {
        /// Every real failure observed before the run wound down.
        failures: Vec<ArtifactFailure>,
    },
}

impl OrchestratorError {
    /// The per-artifact failures, empty for descriptor errors.
    #[must_use]
    pub fn failures(&self) -> &[ArtifactFailure] {
        match self {
            Self::Failed { failures } => failures,
            Self::Descriptor(_) => &[],
        }
    }
}

fn download_prefix(error: &DownloadError) -> &'static str {
    if matches!(error, DownloadError::Integrity { .. }) {
        "download rejected"
    } else {
        "download failed"
    }
}

fn format_failures(failures: &[ArtifactFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("  - {failure}"))
        .collect::<Vec<_>>()
        .join("\n")
}
