//! Run orchestration: plan, resolve, then acquire every artifact concurrently.
//!
//! A run has two phases:
//!
//! 1. **Plan.** Browser-only descriptors are dropped when browser downloads are
//!    disabled, every remaining locator is resolved concurrently, and the
//!    resulting target names are claimed. Nothing is downloaded yet, so a
//!    resolution failure or a name collision stops the run with no files
//!    touched.
//! 2. **Acquire.** One task per planned artifact fetches, extracts and
//!    renames. The first failure cancels a shared token; siblings stop at
//!    their next suspension point and clean up partial downloads. The join
//!    point returns every real failure.

mod catalog;
mod error;

pub use catalog::default_descriptors;
pub use error::{AcquireError, ArtifactFailure, OrchestratorError};

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use url::Url;

use crate::artifact::{
    ArtifactDescriptor, DescriptorSet, ExpectedDigest, RenamePair, TargetNameClaims,
};
use crate::download::{FetchOutcome, HttpClient};
use crate::postprocess::{Extractor, PostprocessReport, Postprocessor, RenameOutcome};
use crate::resolver::{ResolvedUrl, ResolverRegistry};

/// A resolved artifact ready to be acquired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedArtifact {
    /// Local file name inside the working directory.
    pub target_name: String,
    /// Concrete download URL.
    pub url: String,
    /// Digest to verify against: the descriptor's, else the resolver's.
    pub digest: Option<ExpectedDigest>,
    /// Rename applied after extraction.
    pub rename: Option<RenamePair>,
}

/// Output of the planning phase.
#[derive(Debug, Clone, Default)]
pub struct RunPlan {
    /// Artifacts to acquire, in descriptor order.
    pub artifacts: Vec<PlannedArtifact>,
    /// Labels of browser-only descriptors skipped by the toggle.
    pub skipped: Vec<String>,
}

/// What happened to one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactStatus {
    /// Browser-only and browser downloads are disabled.
    SkippedByToggle,
    /// Fetched (or found on disk) and postprocessed.
    Acquired {
        /// Download result.
        fetch: FetchOutcome,
        /// Extraction and rename result.
        postprocess: PostprocessReport,
    },
}

impl fmt::Display for ArtifactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SkippedByToggle => f.write_str("skipped (browser downloads disabled)"),
            Self::Acquired { fetch, postprocess } => {
                match fetch {
                    FetchOutcome::AlreadyPresent => f.write_str("already present")?,
                    FetchOutcome::Downloaded {
                        bytes, algorithm, ..
                    } => write!(f, "downloaded {bytes} bytes ({algorithm})")?,
                }
                if let Some(kind) = postprocess.extracted {
                    write!(f, ", extracted {kind}")?;
                }
                match &postprocess.rename {
                    Some(RenameOutcome::Renamed) => f.write_str(", renamed")?,
                    Some(RenameOutcome::Failed { reason }) => {
                        write!(f, ", rename failed ({reason})")?;
                    }
                    None => {}
                }
                Ok(())
            }
        }
    }
}

/// Per-artifact line of a [`RunReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactReport {
    /// Target name, or the descriptor label for skipped artifacts.
    pub label: String,
    /// Outcome.
    pub status: ArtifactStatus,
}

/// Summary of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// One entry per descriptor: skipped ones first, then acquired ones in
    /// descriptor order.
    pub artifacts: Vec<ArtifactReport>,
}

impl RunReport {
    /// Number of artifacts skipped by the browser toggle.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count(|status| matches!(status, ArtifactStatus::SkippedByToggle))
    }

    /// Number of artifacts found already on disk.
    #[must_use]
    pub fn already_present_count(&self) -> usize {
        self.count(|status| {
            matches!(
                status,
                ArtifactStatus::Acquired {
                    fetch: FetchOutcome::AlreadyPresent,
                    ..
                }
            )
        })
    }

    /// Number of artifacts downloaded in this run.
    #[must_use]
    pub fn downloaded_count(&self) -> usize {
        self.count(|status| {
            matches!(
                status,
                ArtifactStatus::Acquired {
                    fetch: FetchOutcome::Downloaded { .. },
                    ..
                }
            )
        })
    }

    /// Looks up an artifact by label.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&ArtifactStatus> {
        self.artifacts
            .iter()
            .find(|report| report.label == label)
            .map(|report| &report.status)
    }

    fn count(&self, predicate: impl Fn(&ArtifactStatus) -> bool) -> usize {
        self.artifacts
            .iter()
            .filter(|report| predicate(&report.status))
            .count()
    }
}

/// Drives a run over a [`DescriptorSet`].
pub struct Orchestrator {
    registry: Arc<ResolverRegistry>,
    client: HttpClient,
    postprocessor: Postprocessor,
    work_dir: PathBuf,
    download_browsers: bool,
}

impl Orchestrator {
    /// Creates an orchestrator writing into `work_dir`, with browser
    /// downloads enabled.
    #[must_use]
    pub fn new(
        registry: ResolverRegistry,
        client: HttpClient,
        extractor: Arc<dyn Extractor>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            client,
            postprocessor: Postprocessor::new(extractor),
            work_dir: work_dir.into(),
            download_browsers: true,
        }
    }

    /// Enables or disables browser-only descriptors.
    #[must_use]
    pub fn with_download_browsers(mut self, enabled: bool) -> Self {
        self.download_browsers = enabled;
        self
    }

    /// Directory artifacts are written to.
    #[must_use]
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Runs both phases and reports what happened to every descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Descriptor`] if two artifacts resolve to
    /// the same target name, and [`OrchestratorError::Failed`] with every
    /// failed artifact otherwise.
    #[tracing::instrument(
        skip_all,
        fields(work_dir = %self.work_dir.display(), descriptors = descriptors.len())
    )]
    pub async fn run(&self, descriptors: &DescriptorSet) -> Result<RunReport, OrchestratorError> {
        let plan = self.plan(descriptors).await?;

        let mut report = RunReport::default();
        report
            .artifacts
            .extend(plan.skipped.into_iter().map(|label| ArtifactReport {
                label,
                status: ArtifactStatus::SkippedByToggle,
            }));
        report
            .artifacts
            .extend(self.acquire_all(plan.artifacts).await?);

        info!(
            downloaded = report.downloaded_count(),
            already_present = report.already_present_count(),
            skipped = report.skipped_count(),
            "Run complete"
        );
        Ok(report)
    }

    /// Applies the browser toggle, resolves every remaining locator
    /// concurrently and claims the resulting target names.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Failed`] if any locator fails to resolve
    /// (remaining resolutions are aborted), or
    /// [`OrchestratorError::Descriptor`] on an unusable or duplicate target
    /// name.
    pub async fn plan(&self, descriptors: &DescriptorSet) -> Result<RunPlan, OrchestratorError> {
        let mut skipped = Vec::new();
        let mut enabled: Vec<&ArtifactDescriptor> = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors.iter() {
            if descriptor.browser_only && !self.download_browsers {
                info!(
                    artifact = %descriptor.label(),
                    "Skipping browser artifact; browser downloads are disabled"
                );
                skipped.push(descriptor.label());
            } else {
                enabled.push(descriptor);
            }
        }

        let resolved = self.resolve_all(&enabled).await?;

        let mut claims = TargetNameClaims::new();
        let mut artifacts = Vec::with_capacity(enabled.len());
        for (descriptor, resolved) in enabled.into_iter().zip(resolved) {
            let target_name = derive_target_name(descriptor, &resolved);
            claims.claim(&target_name, &descriptor.label())?;
            debug!(target = %target_name, url = %resolved.url, "Planned artifact");
            artifacts.push(PlannedArtifact {
                target_name,
                url: resolved.url,
                digest: descriptor.expected_digest.clone().or(resolved.digest),
                rename: descriptor.rename.clone(),
            });
        }

        Ok(RunPlan { artifacts, skipped })
    }

    async fn resolve_all(
        &self,
        descriptors: &[&ArtifactDescriptor],
    ) -> Result<Vec<ResolvedUrl>, OrchestratorError> {
        let mut tasks = JoinSet::new();
        for (slot, descriptor) in descriptors.iter().enumerate() {
            let registry = Arc::clone(&self.registry);
            let locator = descriptor.locator.clone();
            tasks.spawn(async move { (slot, registry.resolve(&locator).await) });
        }

        let mut resolved: Vec<Option<ResolvedUrl>> = vec![None; descriptors.len()];
        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, Ok(url))) => resolved[slot] = Some(url),
                Ok((slot, Err(resolve_error))) => {
                    let label = descriptors[slot].label();
                    error!(artifact = %label, error = %resolve_error, "Resolution failed");
                    tasks.abort_all();
                    failures.push(ArtifactFailure::new(label, resolve_error));
                }
                Err(join_error) if join_error.is_cancelled() => {}
                Err(join_error) => {
                    tasks.abort_all();
                    failures.push(ArtifactFailure::new(
                        "resolution task",
                        AcquireError::Task {
                            reason: join_error.to_string(),
                        },
                    ));
                }
            }
        }

        if !failures.is_empty() {
            return Err(OrchestratorError::Failed { failures });
        }
        Ok(resolved.into_iter().flatten().collect())
    }

    async fn acquire_all(
        &self,
        artifacts: Vec<PlannedArtifact>,
    ) -> Result<Vec<ArtifactReport>, OrchestratorError> {
        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();
        for (slot, artifact) in artifacts.into_iter().enumerate() {
            let client = self.client.clone();
            let postprocessor = self.postprocessor.clone();
            let work_dir = self.work_dir.clone();
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let result = acquire(&client, &postprocessor, &work_dir, &artifact, &cancel).await;
                (slot, artifact.target_name, result)
            });
        }

        let mut reports = Vec::new();
        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, label, Ok(status))) => {
                    info!(artifact = %label, %status, "Artifact ready");
                    reports.push((slot, ArtifactReport { label, status }));
                }
                Ok((_, label, Err(acquire_error))) if acquire_error.is_cancelled() => {
                    debug!(artifact = %label, "Stopped after cancellation");
                }
                Ok((_, label, Err(acquire_error))) => {
                    error!(
                        artifact = %label,
                        error = %acquire_error,
                        "Artifact failed; cancelling remaining work"
                    );
                    cancel.cancel();
                    failures.push(ArtifactFailure::new(label, acquire_error));
                }
                Err(join_error) => {
                    cancel.cancel();
                    failures.push(ArtifactFailure::new(
                        "acquisition task",
                        AcquireError::Task {
                            reason: join_error.to_string(),
                        },
                    ));
                }
            }
        }

        if !failures.is_empty() {
            return Err(OrchestratorError::Failed { failures });
        }
        reports.sort_by_key(|(slot, _)| *slot);
        Ok(reports.into_iter().map(|(_, report)| report).collect())
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("registry", &self.registry)
            .field("work_dir", &self.work_dir)
            .field("download_browsers", &self.download_browsers)
            .finish_non_exhaustive()
    }
}

async fn acquire(
    client: &HttpClient,
    postprocessor: &Postprocessor,
    work_dir: &Path,
    artifact: &PlannedArtifact,
    cancel: &CancellationToken,
) -> Result<ArtifactStatus, AcquireError> {
    let target_path = work_dir.join(&artifact.target_name);
    let fetch = client
        .fetch(&artifact.url, &target_path, artifact.digest.as_ref(), cancel)
        .await?;

    // Dropping the extraction future kills the child process.
    let postprocess = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(AcquireError::Cancelled),
        processed = postprocessor.process(
            work_dir,
            &artifact.target_name,
            artifact.rename.as_ref(),
        ) => processed?,
    };

    Ok(ArtifactStatus::Acquired { fetch, postprocess })
}

/// Fixed name, else the resolver's file name, else the last URL path segment.
fn derive_target_name(descriptor: &ArtifactDescriptor, resolved: &ResolvedUrl) -> String {
    descriptor
        .target_name
        .clone()
        .or_else(|| resolved.file_name.clone())
        .or_else(|| last_url_segment(&resolved.url))
        .unwrap_or_default()
}

fn last_url_segment(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.next_back()?;
    let decoded = urlencoding::decode(segment).ok()?;
    (!decoded.is_empty()).then(|| decoded.into_owned())
}
