//! Artifact descriptors: static data describing one thing to acquire.
//!
//! A descriptor says *where* an artifact comes from (a [`Locator`]), what the
//! local file should be called, how to verify it, what to rename after
//! extraction, and whether it is a large browser build that can be skipped.
//! Descriptors carry no behavior; resolvers, the download worker and the
//! postprocessor act on them.

mod digest;
mod error;

pub use digest::{ContentHasher, DigestAlgorithm, ExpectedDigest, digest_file};
pub use error::DescriptorError;

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Where an artifact's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// A literal download URL.
    Static {
        /// Absolute URL.
        url: String,
    },
    /// The newest tagged release of a hosted project.
    ReleaseListing {
        /// Account or organization owning the project.
        owner: String,
        /// Project name.
        project: String,
        /// Substring the chosen asset URL must contain (e.g. a platform suffix).
        filter: String,
    },
    /// An object whose path is read from a pointer object in a bucket.
    ObjectPointer {
        /// Bucket name.
        bucket: String,
        /// Object whose content names the build directory.
        pointer_object: String,
        /// Directory prefix joined before the pointer content.
        platform_prefix: String,
        /// File name joined after the pointer content.
        file_name: String,
    },
    /// The object with the highest version among names `<prefix><version><suffix>`.
    ObjectListing {
        /// Bucket name.
        bucket: String,
        /// File name prefix preceding the version.
        file_prefix: String,
        /// Fixed suffix following the version (e.g. `.jar`).
        file_suffix: String,
    },
}

impl Locator {
    /// Creates a static locator.
    #[must_use]
    pub fn url(url: impl Into<String>) -> Self {
        Self::Static { url: url.into() }
    }

    /// Creates a release-listing locator.
    #[must_use]
    pub fn latest_release(
        owner: impl Into<String>,
        project: impl Into<String>,
        filter: impl Into<String>,
    ) -> Self {
        Self::ReleaseListing {
            owner: owner.into(),
            project: project.into(),
            filter: filter.into(),
        }
    }

    /// Creates a pointer-style object-store locator.
    #[must_use]
    pub fn object_pointer(
        bucket: impl Into<String>,
        pointer_object: impl Into<String>,
        platform_prefix: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self::ObjectPointer {
            bucket: bucket.into(),
            pointer_object: pointer_object.into(),
            platform_prefix: platform_prefix.into(),
            file_name: file_name.into(),
        }
    }

    /// Creates a listing-style object-store locator.
    #[must_use]
    pub fn object_listing(
        bucket: impl Into<String>,
        file_prefix: impl Into<String>,
        file_suffix: impl Into<String>,
    ) -> Self {
        Self::ObjectListing {
            bucket: bucket.into(),
            file_prefix: file_prefix.into(),
            file_suffix: file_suffix.into(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static { url } => write!(f, "{url}"),
            Self::ReleaseListing {
                owner,
                project,
                filter,
            } => write!(f, "latest release of {owner}/{project} matching '{filter}'"),
            Self::ObjectPointer {
                bucket,
                pointer_object,
                file_name,
                ..
            } => write!(f, "gs://{bucket}/{pointer_object} -> {file_name}"),
            Self::ObjectListing {
                bucket,
                file_prefix,
                file_suffix,
            } => write!(f, "latest gs://{bucket}/*{file_prefix}<version>{file_suffix}"),
        }
    }
}

/// Path produced by extraction and the stable path it should be moved to.
///
/// Both paths are relative to the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePair {
    produced: PathBuf,
    desired: PathBuf,
}

impl RenamePair {
    /// Creates a rename pair.
    #[must_use]
    pub fn new(produced: impl Into<PathBuf>, desired: impl Into<PathBuf>) -> Self {
        Self {
            produced: produced.into(),
            desired: desired.into(),
        }
    }

    /// Builds a pair from a list, which must have exactly two entries.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::InvalidRename`] for any other length.
    pub fn from_slice<S: AsRef<str>>(paths: &[S]) -> Result<Self, DescriptorError> {
        match paths {
            [produced, desired] => Ok(Self::new(produced.as_ref(), desired.as_ref())),
            other => Err(DescriptorError::InvalidRename { count: other.len() }),
        }
    }

    /// The path extraction produces.
    #[must_use]
    pub fn produced(&self) -> &std::path::Path {
        &self.produced
    }

    /// The path callers expect.
    #[must_use]
    pub fn desired(&self) -> &std::path::Path {
        &self.desired
    }
}

/// Everything needed to acquire and validate one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDescriptor {
    /// Where the bytes come from.
    pub locator: Locator,
    /// Local file name; when `None` it is derived from the resolved location.
    pub target_name: Option<String>,
    /// Digest to verify against; `None` means trust without verifying.
    pub expected_digest: Option<ExpectedDigest>,
    /// Rename applied after extraction.
    pub rename: Option<RenamePair>,
    /// Skipped entirely when browser downloads are disabled.
    pub browser_only: bool,
}

impl ArtifactDescriptor {
    /// Creates a descriptor with no name, digest, rename or browser flag.
    #[must_use]
    pub fn new(locator: Locator) -> Self {
        Self {
            locator,
            target_name: None,
            expected_digest: None,
            rename: None,
            browser_only: false,
        }
    }

    /// Sets a fixed local file name.
    #[must_use]
    pub fn named(mut self, target_name: impl Into<String>) -> Self {
        self.target_name = Some(target_name.into());
        self
    }

    /// Sets the digest to verify against.
    #[must_use]
    pub fn with_digest(mut self, digest: ExpectedDigest) -> Self {
        self.expected_digest = Some(digest);
        self
    }

    /// Sets the post-extraction rename.
    #[must_use]
    pub fn with_rename(mut self, rename: RenamePair) -> Self {
        self.rename = Some(rename);
        self
    }

    /// Marks the descriptor as a browser build.
    #[must_use]
    pub fn browser_only(mut self) -> Self {
        self.browser_only = true;
        self
    }

    /// Human-readable label for logs and errors.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.target_name {
            Some(name) => name.clone(),
            None => self.locator.to_string(),
        }
    }
}

/// Checks that `name` is a plain file name that stays inside the working directory.
///
/// # Errors
///
/// Returns [`DescriptorError::InvalidTargetName`] for empty names, `.`/`..`, or
/// names containing path separators.
pub fn validate_target_name(name: &str) -> Result<(), DescriptorError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if bad {
        return Err(DescriptorError::invalid_target_name(name));
    }
    Ok(())
}

/// Tracks claimed target names and rejects the second claimant of a name.
#[derive(Debug, Default)]
pub struct TargetNameClaims {
    claimed: HashMap<String, String>,
}

impl TargetNameClaims {
    /// Creates an empty claim set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `name` on behalf of `label`.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::InvalidTargetName`] for unusable names and
    /// [`DescriptorError::DuplicateTarget`] if the name is already claimed.
    pub fn claim(&mut self, name: &str, label: &str) -> Result<(), DescriptorError> {
        validate_target_name(name)?;
        if let Some(first) = self.claimed.get(name) {
            return Err(DescriptorError::duplicate_target(name, first, label));
        }
        self.claimed.insert(name.to_string(), label.to_string());
        Ok(())
    }
}

/// An immutable, validated collection of descriptors for one run.
///
/// Fixed target names are unique across the set. Names derived from resolved
/// locations are checked again once resolution has produced them.
#[derive(Debug, Clone, Default)]
pub struct DescriptorSet {
    descriptors: Vec<ArtifactDescriptor>,
}

impl DescriptorSet {
    /// Validates and wraps `descriptors`.
    ///
    /// # Errors
    ///
    /// Returns a [`DescriptorError`] if two descriptors share a fixed target
    /// name or a fixed name is not a plain file name.
    pub fn new(descriptors: Vec<ArtifactDescriptor>) -> Result<Self, DescriptorError> {
        let mut claims = TargetNameClaims::new();
        for (index, descriptor) in descriptors.iter().enumerate() {
            if let Some(name) = &descriptor.target_name {
                claims.claim(name, &format!("descriptor #{index} ({})", descriptor.locator))?;
            }
        }
        Ok(Self { descriptors })
    }

    /// Number of descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Iterates over the descriptors in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ArtifactDescriptor> {
        self.descriptors.iter()
    }
}
