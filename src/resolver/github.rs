//! Release-listing resolver: newest tagged release of a hosted project.
//!
//! Lists the project's releases, parses every tag as a semantic version
//! (tolerantly; unparseable tags are skipped), picks the strictly greatest one
//! and returns the first asset whose download URL contains the locator's
//! filter substring.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::artifact::Locator;

use super::http_client::{build_resolver_http_client, get_json};
use super::version::{parse_tolerant, pick_latest};
use super::{ResolveError, ResolvedUrl, Resolver};

/// Default releases API base URL.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// One release as returned by the listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    /// Git tag the release was cut from.
    pub tag_name: String,
    /// Downloadable files attached to the release.
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// A file attached to a release.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    /// Asset file name.
    pub name: Option<String>,
    /// Direct download URL.
    pub browser_download_url: Option<String>,
}

/// Resolves [`Locator::ReleaseListing`] against the hosted releases API.
pub struct GitHubReleaseResolver {
    client: Client,
    api_url: String,
}

impl GitHubReleaseResolver {
    /// Creates a resolver against `api_url`, normally
    /// [`DEFAULT_GITHUB_API_URL`] or a mock server.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Unavailable`] if HTTP client construction fails.
    pub fn with_api_url(
        api_url: impl Into<String>,
        token: Option<&str>,
    ) -> Result<Self, ResolveError> {
        let client = build_resolver_http_client("github", token)?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Lists the releases of `owner/project`.
    ///
    /// Only the first page (100 releases) is requested; the newest releases are
    /// listed first.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] on transport failure, non-success status or
    /// an undecodable body.
    #[tracing::instrument(skip(self))]
    pub async fn list_releases(
        &self,
        owner: &str,
        project: &str,
    ) -> Result<Vec<Release>, ResolveError> {
        let url = format!(
            "{}/repos/{owner}/{project}/releases?per_page=100",
            self.api_url
        );
        let context = format!("{owner}/{project}");
        get_json(&self.client, &url, Some(GITHUB_ACCEPT), &context).await
    }
}

impl std::fmt::Debug for GitHubReleaseResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubReleaseResolver")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

/// Picks the newest parseable release and its first asset matching `filter`.
///
/// # Errors
///
/// Returns [`ResolveError::NoRelease`] if no tag parses as a version and
/// [`ResolveError::NoMatchingAsset`] if the chosen release has no asset whose
/// URL contains `filter`.
pub fn select_release_asset(
    owner: &str,
    project: &str,
    filter: &str,
    releases: &[Release],
) -> Result<ResolvedUrl, ResolveError> {
    let parsed = releases.iter().filter_map(|release| {
        match parse_tolerant(&release.tag_name) {
            Ok(version) => Some((version, release)),
            Err(error) => {
                debug!(
                    owner,
                    project,
                    tag = %release.tag_name,
                    error = %error,
                    "Ignoring release with unparseable tag"
                );
                None
            }
        }
    });

    let Some((version, release)) = pick_latest(parsed) else {
        return Err(ResolveError::no_release(&format!("{owner}/{project}")));
    };
    debug!(owner, project, %version, tag = %release.tag_name, "Selected latest release");

    let asset = release.assets.iter().find_map(|asset| {
        let url = asset.browser_download_url.as_deref()?;
        url.contains(filter).then_some((asset, url))
    });
    let Some((asset, url)) = asset else {
        return Err(ResolveError::no_matching_asset(
            owner,
            project,
            &release.tag_name,
            filter,
        ));
    };

    let context = format!("{owner}/{project}");
    let parsed_url = Url::parse(url).map_err(|_| ResolveError::invalid_url(&context, url))?;
    let file_name = asset
        .name
        .clone()
        .filter(|name| !name.is_empty())
        .or_else(|| last_path_segment(&parsed_url));

    let mut resolved = ResolvedUrl::new(url);
    resolved.file_name = file_name;
    Ok(resolved)
}

fn last_path_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .next_back()
        .filter(|segment| !segment.is_empty())
        .map(ToString::to_string)
}

#[async_trait]
impl Resolver for GitHubReleaseResolver {
    fn name(&self) -> &'static str {
        "github-releases"
    }

    fn can_handle(&self, locator: &Locator) -> bool {
        matches!(locator, Locator::ReleaseListing { .. })
    }

    #[tracing::instrument(skip(self), fields(resolver = "github-releases"))]
    async fn resolve(&self, locator: &Locator) -> Result<ResolvedUrl, ResolveError> {
        let Locator::ReleaseListing {
            owner,
            project,
            filter,
        } = locator
        else {
            return Err(ResolveError::no_resolver(locator));
        };

        let releases = self.list_releases(owner, project).await?;
        debug!(count = releases.len(), "Listed releases");
        let resolved = select_release_asset(owner, project, filter, &releases)?;
        info!(
            owner = %owner,
            project = %project,
            url = %resolved.url,
            "Resolved latest release asset"
        );
        Ok(resolved)
    }
}
