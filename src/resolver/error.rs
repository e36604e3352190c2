//! Error types for locator resolution.
//!
//! Every variant carries enough context (owner/project, bucket, URL) to tell
//! which artifact's lookup failed without consulting the logs.

use thiserror::Error;

/// Errors that can occur while turning a locator into a download URL.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// No registered resolver handles this kind of locator.
    #[error("no resolver registered for locator '{locator}'")]
    NoResolver {
        /// Display form of the locator.
        locator: String,
    },

    /// Nothing with a parseable version was found.
    #[error("no release found for {context}")]
    NoRelease {
        /// Owner/project or bucket description.
        context: String,
    },

    /// The newest release has no asset whose URL contains the filter.
    #[error("release {tag} of {owner}/{project} has no asset containing '{filter}'")]
    NoMatchingAsset {
        /// Release owner.
        owner: String,
        /// Release project.
        project: String,
        /// Tag of the selected release.
        tag: String,
        /// Required URL substring.
        filter: String,
    },

    /// The pointer object could not be read or was empty.
    #[error("cannot read pointer object gs://{bucket}/{object}: {reason}")]
    PointerUnreadable {
        /// Bucket holding the pointer.
        bucket: String,
        /// Pointer object name.
        object: String,
        /// What went wrong.
        reason: String,
    },

    /// A lookup request failed before a response arrived, or its body was unusable.
    #[error("request for {context} failed ({url}): {reason}")]
    Request {
        /// Owner/project or bucket description.
        context: String,
        /// Requested URL.
        url: String,
        /// Underlying error text.
        reason: String,
    },

    /// A lookup request returned a non-success status.
    #[error("HTTP {status} for {context} ({url})")]
    HttpStatus {
        /// Owner/project or bucket description.
        context: String,
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// A resolver produced something that is not an absolute URL.
    #[error("resolver for {context} produced invalid URL '{url}'")]
    InvalidUrl {
        /// Owner/project or bucket description.
        context: String,
        /// The rejected URL.
        url: String,
    },

    /// Resolver setup failed (e.g. HTTP client construction).
    #[error("resolver '{resolver}' unavailable: {reason}")]
    Unavailable {
        /// Resolver name.
        resolver: String,
        /// Why construction failed.
        reason: String,
    },
}

impl ResolveError {
    /// Creates a `NoResolver` error.
    #[must_use]
    pub fn no_resolver(locator: impl ToString) -> Self {
        Self::NoResolver {
            locator: locator.to_string(),
        }
    }

    /// Creates a `NoRelease` error.
    #[must_use]
    pub fn no_release(context: &str) -> Self {
        Self::NoRelease {
            context: context.to_string(),
        }
    }

    /// Creates a `NoMatchingAsset` error.
    #[must_use]
    pub fn no_matching_asset(owner: &str, project: &str, tag: &str, filter: &str) -> Self {
        Self::NoMatchingAsset {
            owner: owner.to_string(),
            project: project.to_string(),
            tag: tag.to_string(),
            filter: filter.to_string(),
        }
    }

    /// Creates a `PointerUnreadable` error.
    #[must_use]
    pub fn pointer_unreadable(bucket: &str, object: &str, reason: impl ToString) -> Self {
        Self::PointerUnreadable {
            bucket: bucket.to_string(),
            object: object.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates a `Request` error.
    #[must_use]
    pub fn request(context: &str, url: &str, reason: impl ToString) -> Self {
        Self::Request {
            context: context.to_string(),
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates an `HttpStatus` error.
    #[must_use]
    pub fn http_status(context: &str, url: &str, status: u16) -> Self {
        Self::HttpStatus {
            context: context.to_string(),
            url: url.to_string(),
            status,
        }
    }

    /// Creates an `InvalidUrl` error.
    #[must_use]
    pub fn invalid_url(context: &str, url: &str) -> Self {
        Self::InvalidUrl {
            context: context.to_string(),
            url: url.to_string(),
        }
    }

    /// Creates an `Unavailable` error.
    #[must_use]
    pub fn unavailable(resolver: &str, reason: impl ToString) -> Self {
        Self::Unavailable {
            resolver: resolver.to_string(),
            reason: reason.to_string(),
        }
    }
}
