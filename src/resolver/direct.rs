//! Static locator resolver - passthrough for literal URLs.

use async_trait::async_trait;
use url::Url;

use crate::artifact::Locator;

use super::{ResolveError, ResolvedUrl, Resolver};

/// Resolves [`Locator::Static`] by returning its URL unchanged.
///
/// The URL is still checked to be absolute so that nothing relative ever
/// reaches the download worker.
#[derive(Debug, Default)]
pub struct DirectResolver;

impl DirectResolver {
    /// Creates a new `DirectResolver`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Resolver for DirectResolver {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn can_handle(&self, locator: &Locator) -> bool {
        matches!(locator, Locator::Static { .. })
    }

    #[tracing::instrument(skip(self), fields(resolver = "direct"))]
    async fn resolve(&self, locator: &Locator) -> Result<ResolvedUrl, ResolveError> {
        let Locator::Static { url } = locator else {
            return Err(ResolveError::no_resolver(locator));
        };
        if Url::parse(url).is_err() {
            return Err(ResolveError::invalid_url("static locator", url));
        }
        Ok(ResolvedUrl::new(url.clone()))
    }
}
