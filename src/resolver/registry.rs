//! Resolver registry dispatching locators to the resolver that handles them.

use tracing::debug;

use crate::artifact::Locator;

use super::{ResolveError, ResolvedUrl, Resolver};

/// An ordered collection of resolvers.
///
/// Each locator is handed to the first registered resolver that can handle
/// it. Resolution failures are returned as-is; there is no fallback chain,
/// since a locator kind has exactly one meaningful backend.
pub struct ResolverRegistry {
    resolvers: Vec<Box<dyn Resolver>>,
}

impl ResolverRegistry {
    /// Creates an empty resolver registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resolvers: Vec::new(),
        }
    }

    /// Registers a resolver with the registry.
    #[tracing::instrument(skip(self, resolver), fields(resolver_name))]
    pub fn register(&mut self, resolver: Box<dyn Resolver>) {
        tracing::Span::current().record("resolver_name", resolver.name());
        debug!(name = resolver.name(), "Registering resolver");
        self.resolvers.push(resolver);
    }

    /// Returns the number of registered resolvers.
    #[must_use]
    pub fn resolver_count(&self) -> usize {
        self.resolvers.len()
    }

    /// Returns true if no resolvers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Returns the first resolver that can handle `locator`.
    #[must_use]
    pub fn find_handler(&self, locator: &Locator) -> Option<&dyn Resolver> {
        self.resolvers
            .iter()
            .find(|r| r.can_handle(locator))
            .map(AsRef::as_ref)
    }

    /// Resolves `locator` into a concrete, absolute download URL.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NoResolver`] if no registered resolver handles
    /// the locator, or the handler's own error.
    #[tracing::instrument(skip(self), fields(locator = %locator))]
    pub async fn resolve(&self, locator: &Locator) -> Result<ResolvedUrl, ResolveError> {
        let Some(handler) = self.find_handler(locator) else {
            return Err(ResolveError::no_resolver(locator));
        };
        debug!(resolver = handler.name(), "Dispatching locator");
        handler.resolve(locator).await
    }
}

impl std::fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.resolvers.iter().map(|r| r.name()).collect();
        f.debug_struct("ResolverRegistry")
            .field("resolver_count", &self.resolvers.len())
            .field("resolvers", &names)
            .finish()
    }
}

impl Default for ResolverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
