//! Content digests used to verify downloaded artifacts.
//!
//! The algorithm is chosen once, when a descriptor is built, and travels with
//! the expected value. Each algorithm knows how to start a fresh accumulator
//! and how to render its result as lowercase hex.

use std::fmt;
use std::path::Path;

use md5::Md5;
use sha2::{Digest, Sha256};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use super::DescriptorError;

/// Read buffer size when hashing a file already on disk.
const HASH_BUFFER_BYTES: usize = 64 * 1024;

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DigestAlgorithm {
    /// SHA-256, the default for pinned artifacts.
    #[default]
    Sha256,
    /// MD5, as reported by the object store for its objects.
    Md5,
}

impl DigestAlgorithm {
    /// Starts a new running digest for this algorithm.
    #[must_use]
    pub fn hasher(self) -> ContentHasher {
        match self {
            Self::Sha256 => ContentHasher::Sha256(Sha256::new()),
            Self::Md5 => ContentHasher::Md5(Md5::new()),
        }
    }

    /// Stable lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Md5 => "md5",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A running digest over a byte stream.
#[derive(Debug, Clone)]
pub enum ContentHasher {
    Sha256(Sha256),
    Md5(Md5),
}

impl ContentHasher {
    /// Feeds another chunk into the digest.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(hasher) => hasher.update(data),
            Self::Md5(hasher) => hasher.update(data),
        }
    }

    /// Consumes the accumulator and returns the lowercase hex digest.
    #[must_use]
    pub fn finalize_hex(self) -> String {
        match self {
            Self::Sha256(hasher) => hex::encode(hasher.finalize()),
            Self::Md5(hasher) => hex::encode(hasher.finalize()),
        }
    }
}

/// A digest an artifact is expected to have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedDigest {
    algorithm: DigestAlgorithm,
    hex: String,
}

impl ExpectedDigest {
    /// Creates an expected digest, validating that `hex` is well-formed for `algorithm`.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::MalformedDigest`] when `hex` is not valid hex
    /// of the algorithm's output length.
    pub fn new(
        algorithm: DigestAlgorithm,
        hex: impl Into<String>,
    ) -> Result<Self, DescriptorError> {
        let hex = hex.into().trim().to_ascii_lowercase();
        let expected_len = match algorithm {
            DigestAlgorithm::Sha256 => 64,
            DigestAlgorithm::Md5 => 32,
        };
        if hex.len() != expected_len || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DescriptorError::malformed_digest(algorithm, &hex));
        }
        Ok(Self { algorithm, hex })
    }

    /// Shorthand for a SHA-256 digest.
    ///
    /// # Errors
    ///
    /// See [`ExpectedDigest::new`].
    pub fn sha256(hex: impl Into<String>) -> Result<Self, DescriptorError> {
        Self::new(DigestAlgorithm::Sha256, hex)
    }

    /// Shorthand for an MD5 digest.
    ///
    /// # Errors
    ///
    /// See [`ExpectedDigest::new`].
    pub fn md5(hex: impl Into<String>) -> Result<Self, DescriptorError> {
        Self::new(DigestAlgorithm::Md5, hex)
    }

    /// The algorithm this digest was computed with.
    #[must_use]
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Lowercase hex value.
    #[must_use]
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Returns true if `actual_hex` equals this digest (case-insensitive).
    #[must_use]
    pub fn matches(&self, actual_hex: &str) -> bool {
        self.hex.eq_ignore_ascii_case(actual_hex)
    }
}

impl fmt::Display for ExpectedDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

/// Hashes an existing file with `algorithm` without loading it into memory.
///
/// # Errors
///
/// Returns the underlying IO error if the file cannot be opened or read.
pub async fn digest_file(path: &Path, algorithm: DigestAlgorithm) -> std::io::Result<String> {
    let mut file = File::open(path).await?;
    let mut hasher = algorithm.hasher();
    let mut buffer = vec![0u8; HASH_BUFFER_BYTES];
    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hasher.finalize_hex())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
    const HELLO_MD5: &str = "5d41402abc4b2a76b9719d911017c592";

    #[test]
    fn test_sha256_hasher_matches_known_value() {
        let mut hasher = DigestAlgorithm::Sha256.hasher();
        hasher.update(b"hel");
        hasher.update(b"lo");
        assert_eq!(hasher.finalize_hex(), HELLO_SHA256);
    }

    #[test]
    fn test_md5_hasher_matches_known_value() {
        let mut hasher = DigestAlgorithm::Md5.hasher();
        hasher.update(b"hello");
        assert_eq!(hasher.finalize_hex(), HELLO_MD5);
    }

    #[test]
    fn test_default_algorithm_is_sha256() {
        assert_eq!(DigestAlgorithm::default(), DigestAlgorithm::Sha256);
    }

    #[test]
    fn test_expected_digest_normalizes_case() {
        let digest = ExpectedDigest::md5(HELLO_MD5.to_uppercase()).unwrap();
        assert_eq!(digest.hex(), HELLO_MD5);
        assert!(digest.matches(HELLO_MD5));
        assert!(digest.matches(&HELLO_MD5.to_uppercase()));
    }

    #[test]
    fn test_expected_digest_rejects_wrong_length() {
        let result = ExpectedDigest::sha256(HELLO_MD5);
        assert!(matches!(result, Err(DescriptorError::MalformedDigest { .. })));
    }

    #[test]
    fn test_expected_digest_rejects_non_hex() {
        let result = ExpectedDigest::md5("z".repeat(32));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_digest_file_streams_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, b"hello").unwrap();

        let sha = digest_file(&path, DigestAlgorithm::Sha256).await.unwrap();
        let md5 = digest_file(&path, DigestAlgorithm::Md5).await.unwrap();
        assert_eq!(sha, HELLO_SHA256);
        assert_eq!(md5, HELLO_MD5);
    }
}
