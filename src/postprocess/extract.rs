//! Extraction capability and its subprocess-backed implementation.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::{ArchiveKind, PostprocessError};

/// Unpacks an archive into a directory.
///
/// The orchestrator holds an `Arc<dyn Extractor>`, so tests can swap in a
/// recording implementation instead of spawning real tools.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extracts `archive` (a file name relative to `work_dir`) into `work_dir`,
    /// overwriting existing entries.
    async fn extract(
        &self,
        kind: ArchiveKind,
        archive: &str,
        work_dir: &Path,
    ) -> Result<(), PostprocessError>;
}

/// Runs `unzip -o` / `tar -xzf` / `tar -xjf` as child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandExtractor;

impl CommandExtractor {
    /// Creates a new `CommandExtractor`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Extractor for CommandExtractor {
    #[tracing::instrument(skip(self, work_dir), fields(kind = %kind))]
    async fn extract(
        &self,
        kind: ArchiveKind,
        archive: &str,
        work_dir: &Path,
    ) -> Result<(), PostprocessError> {
        let (tool, args) = kind.command();
        info!(archive, tool, "Extracting");

        let mut cmd = Command::new(tool);
        cmd.args(args)
            .arg(archive)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = cmd
            .output()
            .await
            .map_err(|e| PostprocessError::spawn(archive, tool, e))?;

        if output.status.success() {
            debug!(archive, tool, "Extraction finished");
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        let reason = if stderr.is_empty() {
            output.status.to_string()
        } else {
            format!("{}: {stderr}", output.status)
        };
        Err(PostprocessError::extraction(archive, tool, reason))
    }
}
