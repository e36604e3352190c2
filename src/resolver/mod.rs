//! Locator resolution: turning "latest of X" queries into download URLs.
//!
//! # Architecture
//!
//! - [`Resolver`] - Async trait that individual resolvers implement
//! - [`ResolverRegistry`] - Dispatches a [`Locator`] to the resolver that handles it
//! - [`DirectResolver`] - Static URLs (identity)
//! - [`GitHubReleaseResolver`] - Newest tagged release of a hosted project
//! - [`PointerResolver`] - Object named by a pointer object in a bucket
//! - [`ObjectListingResolver`] - Highest-versioned object in a bucket
//!
//! # Example
//!
//! ```no_run
//! use testprep::artifact::Locator;
//! use testprep::resolver::{ResolverEndpoints, build_default_resolver_registry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = build_default_resolver_registry(&ResolverEndpoints::default())?;
//! let resolved = registry
//!     .resolve(&Locator::latest_release("mozilla", "geckodriver", "-linux64"))
//!     .await?;
//! println!("Resolved URL: {}", resolved.url);
//! # Ok(())
//! # }
//! ```

mod direct;
mod error;
mod github;
mod http_client;
mod registry;
mod storage;
pub mod version;

pub use direct::DirectResolver;
pub use error::ResolveError;
pub use github::{
    DEFAULT_GITHUB_API_URL, GitHubReleaseResolver, Release, ReleaseAsset, select_release_asset,
};
pub use http_client::{
    CONNECT_TIMEOUT_SECS as RESOLVER_CONNECT_TIMEOUT_SECS,
    REQUEST_TIMEOUT_SECS as RESOLVER_REQUEST_TIMEOUT_SECS, configure_resolver_http_timeouts,
};
pub use registry::ResolverRegistry;
pub use storage::{
    DEFAULT_STORAGE_API_URL, ObjectListingResolver, ObjectMetadata, ObjectStoreClient,
    PointerResolver, select_latest_object,
};

use std::sync::Arc;

use async_trait::async_trait;

use crate::artifact::{ExpectedDigest, Locator};

/// Base URLs and credentials for the remote APIs resolvers talk to.
#[derive(Debug, Clone)]
pub struct ResolverEndpoints {
    /// Releases API base URL.
    pub github_api_url: String,
    /// Object-store API base URL.
    pub storage_api_url: String,
    /// Optional token for the releases API.
    pub github_token: Option<String>,
}

impl Default for ResolverEndpoints {
    fn default() -> Self {
        Self {
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            storage_api_url: DEFAULT_STORAGE_API_URL.to_string(),
            github_token: None,
        }
    }
}

/// Builds the registry used by the CLI: static, release-listing and both
/// object-store resolvers, sharing one object-store client.
///
/// # Errors
///
/// Returns [`ResolveError::Unavailable`] if an HTTP client cannot be built.
pub fn build_default_resolver_registry(
    endpoints: &ResolverEndpoints,
) -> Result<ResolverRegistry, ResolveError> {
    let mut registry = ResolverRegistry::new();
    registry.register(Box::new(DirectResolver::new()));
    registry.register(Box::new(GitHubReleaseResolver::with_api_url(
        endpoints.github_api_url.clone(),
        endpoints.github_token.as_deref(),
    )?));

    let store = Arc::new(ObjectStoreClient::with_base_url(
        endpoints.storage_api_url.clone(),
    )?);
    registry.register(Box::new(PointerResolver::new(Arc::clone(&store))));
    registry.register(Box::new(ObjectListingResolver::new(store)));
    Ok(registry)
}

/// The concrete result of resolving a locator. Consumed once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrl {
    /// Absolute download URL.
    pub url: String,
    /// File name suggested by the backend (asset or object name).
    pub file_name: Option<String>,
    /// Digest reported by the backend, used when the descriptor declares none.
    pub digest: Option<ExpectedDigest>,
}

impl ResolvedUrl {
    /// Creates a resolved URL with no file name or digest.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            file_name: None,
            digest: None,
        }
    }
}

/// Trait that all resolvers implement.
///
/// # Object Safety
///
/// This trait uses `async_trait` to support dynamic dispatch via `Box<dyn Resolver>`.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Returns the resolver's name (e.g., "direct", "github-releases").
    fn name(&self) -> &str;

    /// Returns true if this resolver handles the locator's kind.
    fn can_handle(&self, locator: &Locator) -> bool;

    /// Resolves the locator into a concrete download URL.
    async fn resolve(&self, locator: &Locator) -> Result<ResolvedUrl, ResolveError>;
}
