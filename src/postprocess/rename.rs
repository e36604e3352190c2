//! Best-effort rename of an extracted entry.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::artifact::RenamePair;

/// Result of the rename step. A failure never fails the artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    /// `produced` now lives at `desired`.
    Renamed,
    /// The move failed; the reason was logged as a warning.
    Failed {
        /// Underlying error text.
        reason: String,
    },
}

impl RenameOutcome {
    /// Returns true if the entry was moved.
    #[must_use]
    pub fn is_renamed(&self) -> bool {
        matches!(self, Self::Renamed)
    }
}

/// Moves `pair.produced()` to `pair.desired()`, both relative to `work_dir`.
///
/// Whatever already sits at the destination is removed first; errors from
/// that removal are ignored since the destination usually does not exist.
pub async fn apply_rename(work_dir: &Path, pair: &RenamePair) -> RenameOutcome {
    let from = work_dir.join(pair.produced());
    let to = work_dir.join(pair.desired());
    info!(from = %pair.produced().display(), to = %pair.desired().display(), "Renaming");

    clear_destination(&to).await;

    match tokio::fs::rename(&from, &to).await {
        Ok(()) => RenameOutcome::Renamed,
        Err(error) => {
            warn!(
                from = %from.display(),
                to = %to.display(),
                error = %error,
                "Rename failed; continuing"
            );
            RenameOutcome::Failed {
                reason: error.to_string(),
            }
        }
    }
}

async fn clear_destination(path: &Path) {
    let Ok(meta) = tokio::fs::symlink_metadata(path).await else {
        return;
    };
    let removed = if meta.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };
    if let Err(error) = removed {
        debug!(
            path = %path.display(),
            error = %error,
            "Ignoring failure to clear rename destination"
        );
    }
}
