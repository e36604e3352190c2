//! Error types for the download module.
//!
//! Transport failures (`Network`, `Timeout`, `HttpStatus`) are kept apart from
//! `Integrity` so that "couldn't fetch" and "fetched the wrong bytes" read
//! differently in the run summary.

use std::path::PathBuf;

use thiserror::Error;

use crate::artifact::DigestAlgorithm;

/// Errors that can occur while fetching one artifact.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS, broken stream).
    #[error("network error downloading {url} into {target}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// Target file name.
        target: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url} into {target}")]
    Timeout {
        /// The URL that timed out.
        url: String,
        /// Target file name.
        target: String,
    },

    /// Non-success HTTP response.
    #[error("HTTP {status} downloading {url} into {target}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// Target file name.
        target: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error (create, write, read-back for the pre-check).
    #[error("IO error on {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The resolved URL is malformed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// Downloaded content does not match the declared digest.
    #[error(
        "integrity check failed for {target} from {url}: \
         expected {algorithm} {expected}, got {actual}"
    )]
    Integrity {
        /// Target file name.
        target: String,
        /// Source URL.
        url: String,
        /// Digest algorithm used.
        algorithm: DigestAlgorithm,
        /// Declared digest (lowercase hex).
        expected: String,
        /// Computed digest (lowercase hex).
        actual: String,
    },

    /// The run was cancelled while this download was in flight.
    #[error("download of {url} into {target} cancelled")]
    Cancelled {
        /// Source URL.
        url: String,
        /// Target file name.
        target: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build download HTTP client: {source}")]
    Client {
        /// The builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error.
    pub fn network(
        url: impl Into<String>,
        target: impl Into<String>,
        source: reqwest::Error,
    ) -> Self {
        Self::Network {
            url: url.into(),
            target: target.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>, target: impl Into<String>) -> Self {
        Self::Timeout {
            url: url.into(),
            target: target.into(),
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, target: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            target: target.into(),
            status,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an integrity mismatch error.
    pub fn integrity(
        target: impl Into<String>,
        url: impl Into<String>,
        algorithm: DigestAlgorithm,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::Integrity {
            target: target.into(),
            url: url.into(),
            algorithm,
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a cancellation marker.
    pub fn cancelled(url: impl Into<String>, target: impl Into<String>) -> Self {
        Self::Cancelled {
            url: url.into(),
            target: target.into(),
        }
    }

    /// Maps a reqwest transport error, splitting out timeouts.
    pub(crate) fn from_transport(url: &str, target: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::timeout(url, target)
        } else {
            Self::network(url, target, source)
        }
    }

    /// Returns true for failures to fetch bytes (as opposed to wrong bytes).
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Timeout { .. } | Self::HttpStatus { .. }
        )
    }

    /// Returns true if the download stopped because the run was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

// No From<reqwest::Error> / From<std::io::Error>: every variant needs the url,
// target or path the source error does not carry.
