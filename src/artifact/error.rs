//! Error types for descriptor construction and validation.

use thiserror::Error;

use super::DigestAlgorithm;

/// Errors raised while building or validating a descriptor set.
///
/// These are all detected before any network work starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    /// Two descriptors would write the same local file.
    #[error("duplicate target name '{target_name}': used by {first} and {second}")]
    DuplicateTarget {
        /// The colliding file name.
        target_name: String,
        /// Label of the first descriptor claiming the name.
        first: String,
        /// Label of the second descriptor claiming the name.
        second: String,
    },

    /// A target name is empty or would escape the working directory.
    #[error("invalid target name '{target_name}': must be a plain file name")]
    InvalidTargetName {
        /// The rejected name.
        target_name: String,
    },

    /// A rename specification did not have exactly two entries.
    #[error("rename needs exactly two paths (produced, desired), got {count}")]
    InvalidRename {
        /// Number of entries supplied.
        count: usize,
    },

    /// A digest was not valid hex of the algorithm's output size.
    #[error("malformed {algorithm} digest '{value}'")]
    MalformedDigest {
        /// Declared algorithm.
        algorithm: DigestAlgorithm,
        /// The rejected value.
        value: String,
    },
}

impl DescriptorError {
    /// Creates a `DuplicateTarget` error.
    #[must_use]
    pub fn duplicate_target(target_name: &str, first: &str, second: &str) -> Self {
        Self::DuplicateTarget {
            target_name: target_name.to_string(),
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    /// Creates an `InvalidTargetName` error.
    #[must_use]
    pub fn invalid_target_name(target_name: &str) -> Self {
        Self::InvalidTargetName {
            target_name: target_name.to_string(),
        }
    }

    /// Creates a `MalformedDigest` error.
    #[must_use]
    pub fn malformed_digest(algorithm: DigestAlgorithm, value: &str) -> Self {
        Self::MalformedDigest {
            algorithm,
            value: value.to_string(),
        }
    }
}
