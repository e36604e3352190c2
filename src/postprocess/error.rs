//! Error types for the postprocess module.

use thiserror::Error;

/// Errors that fail an artifact's postprocessing step.
///
/// Rename problems are not here: they are reported through
/// [`RenameOutcome::Failed`](super::RenameOutcome::Failed) and never fail a task.
#[derive(Debug, Error)]
pub enum PostprocessError {
    /// The unpack tool ran and reported failure.
    #[error("extracting {target} with {tool} failed: {reason}")]
    Extraction {
        /// Archive file name.
        target: String,
        /// Tool that was invoked.
        tool: String,
        /// Exit status and captured stderr.
        reason: String,
    },

    /// The unpack tool could not be started.
    #[error("cannot run {tool} to extract {target}: {source}")]
    Spawn {
        /// Archive file name.
        target: String,
        /// Tool that was invoked.
        tool: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl PostprocessError {
    /// Creates an extraction failure.
    pub fn extraction(
        target: impl Into<String>,
        tool: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Extraction {
            target: target.into(),
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Creates a spawn failure.
    pub fn spawn(
        target: impl Into<String>,
        tool: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::Spawn {
            target: target.into(),
            tool: tool.into(),
            source,
        }
    }
}
