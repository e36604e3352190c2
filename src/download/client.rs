//! HTTP client wrapper for fetching artifacts.
//!
//! This module provides the `HttpClient` struct which streams a response body
//! to disk and into a digest accumulator in a single pass.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS, WRITE_BUFFER_BYTES};
use super::error::DownloadError;
use crate::artifact::{DigestAlgorithm, ExpectedDigest, digest_file};
use crate::user_agent;

/// HTTP client for fetching artifacts with streaming digest computation.
///
/// Created once per run and shared by every acquisition task, taking
/// advantage of connection pooling.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use testprep::download::HttpClient;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new()?;
/// let outcome = client
///     .fetch(
///         "https://example.com/server.jar",
///         Path::new("./server.jar"),
///         None,
///         &CancellationToken::new(),
///     )
///     .await?;
/// println!("{outcome:?}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

/// What [`HttpClient::fetch`] did for a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The target was already on disk (and matched its digest, if one was declared).
    AlreadyPresent,
    /// The target was downloaded.
    Downloaded {
        /// Bytes written.
        bytes: u64,
        /// Algorithm used for `digest`.
        algorithm: DigestAlgorithm,
        /// Hex digest of the written content.
        digest: String,
    },
}

impl FetchOutcome {
    /// Returns true if no network request was made.
    #[must_use]
    pub fn was_skipped(&self) -> bool {
        matches!(self, Self::AlreadyPresent)
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes
    /// - No transparent decompression (archives must be stored byte-for-byte)
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Client`] if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, DownloadError> {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Client`] if the client cannot be built.
    pub fn new_with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_timeout_secs))
            .user_agent(user_agent::default_user_agent())
            .build()
            .map_err(|source| DownloadError::Client { source })?;
        Ok(Self { client })
    }

    /// Fetches `url` into `target_path` unless it is already there.
    ///
    /// The pre-check skips the network entirely when the target exists and
    /// either no digest is declared or its digest equals `expected`. Otherwise
    /// the body is streamed to the target (created or truncated) while being
    /// hashed, then compared against `expected`.
    ///
    /// On a mid-stream transport error the partial file is kept when a digest
    /// is declared (the next run's pre-check rejects it) and removed otherwise.
    /// A file that fails verification stays on disk for inspection. A
    /// cancelled download always removes its partial file.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] on transport failure, non-success status,
    /// file system error, digest mismatch or cancellation.
    #[instrument(skip(self, expected, cancel), fields(target = %target_path.display()))]
    pub async fn fetch(
        &self,
        url: &str,
        target_path: &Path,
        expected: Option<&ExpectedDigest>,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, DownloadError> {
        let target = target_label(target_path);

        if is_already_present(target_path, expected).await? {
            info!(target = %target, "Already present, skipping download");
            return Ok(FetchOutcome::AlreadyPresent);
        }

        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DownloadError::cancelled(url, &target)),
            response = self.send_request(url, &target) => response?,
        };

        let file = File::create(target_path)
            .await
            .map_err(|e| DownloadError::io(target_path, e))?;

        let algorithm = expected.map_or_else(DigestAlgorithm::default, ExpectedDigest::algorithm);
        let streamed =
            stream_to_file(file, response, url, &target, target_path, algorithm, cancel).await;

        let (bytes, actual) = match streamed {
            Ok(done) => done,
            Err(error) => {
                if error.is_cancelled() || expected.is_none() {
                    debug!(path = %target_path.display(), "Removing partial file");
                    let _ = tokio::fs::remove_file(target_path).await;
                }
                return Err(error);
            }
        };

        if let Some(expected) = expected
            && !expected.matches(&actual)
        {
            return Err(DownloadError::integrity(
                &target,
                url,
                algorithm,
                expected.hex(),
                actual,
            ));
        }

        info!(
            target = %target,
            bytes,
            %algorithm,
            digest = %actual,
            verified = expected.is_some(),
            "Download complete"
        );
        Ok(FetchOutcome::Downloaded {
            bytes,
            algorithm,
            digest: actual,
        })
    }

    async fn send_request(
        &self,
        url: &str,
        target: &str,
    ) -> Result<reqwest::Response, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::from_transport(url, target, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, target, status.as_u16()));
        }
        Ok(response)
    }
}

/// Streams the response body to `file`, hashing as it goes.
///
/// Returns bytes written and the hex digest.
async fn stream_to_file(
    file: File,
    response: reqwest::Response,
    url: &str,
    target: &str,
    file_path: &Path,
    algorithm: DigestAlgorithm,
    cancel: &CancellationToken,
) -> Result<(u64, String), DownloadError> {
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_BYTES, file);
    let mut stream = response.bytes_stream();
    let mut hasher = algorithm.hasher();
    let mut bytes_written: u64 = 0;

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DownloadError::cancelled(url, target)),
            next = stream.next() => next,
        };
        let Some(chunk_result) = next else {
            break;
        };
        let chunk = chunk_result.map_err(|e| DownloadError::from_transport(url, target, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;
        hasher.update(&chunk);
        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok((bytes_written, hasher.finalize_hex()))
}

/// Pre-check: is `path` already a usable copy of the artifact?
async fn is_already_present(
    path: &Path,
    expected: Option<&ExpectedDigest>,
) -> Result<bool, DownloadError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return Ok(false),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(DownloadError::io(path, e)),
    }

    let Some(expected) = expected else {
        return Ok(true);
    };
    let actual = digest_file(path, expected.algorithm())
        .await
        .map_err(|e| DownloadError::io(path, e))?;
    if expected.matches(&actual) {
        return Ok(true);
    }
    warn!(
        path = %path.display(),
        expected = %expected,
        actual = %actual,
        "Existing file does not match digest, downloading again"
    );
    Ok(false)
}

fn target_label(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
    const HELLO_MD5: &str = "5d41402abc4b2a76b9719d911017c592";

    #[tokio::test]
    async fn test_fetch_downloads_and_hashes() {
        let server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/hello.jar"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"hello"))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let target = temp_dir.path().join("hello.jar");
        let expected = ExpectedDigest::sha256(HELLO_SHA256).unwrap();
        let outcome = client
            .fetch(
                &format!("{}/hello.jar", server.uri()),
                &target,
                Some(&expected),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(
            outcome,
            FetchOutcome::Downloaded {
                bytes: 5,
                algorithm: DigestAlgorithm::Sha256,
                digest: HELLO_SHA256.to_string(),
            }
        );
        assert_eq!(std::fs::read(&target).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_fetch_skips_when_digest_matches() {
        let server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"other"))
            .expect(0)
            .mount(&server)
            .await;

        let target = temp_dir.path().join("hello.zip");
        std::fs::write(&target, b"hello").unwrap();
        let expected = ExpectedDigest::md5(HELLO_MD5).unwrap();

        let client = HttpClient::new().unwrap();
        let outcome = client
            .fetch(
                &format!("{}/hello.zip", server.uri()),
                &target,
                Some(&expected),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(outcome.was_skipped());
        assert_eq!(std::fs::read(&target).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_fetch_trusts_existing_file_without_digest() {
        let server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let target = temp_dir.path().join("driver.tar.gz");
        std::fs::write(&target, b"anything").unwrap();

        let client = HttpClient::new().unwrap();
        let outcome = client
            .fetch(
                &format!("{}/driver.tar.gz", server.uri()),
                &target,
                None,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(outcome, FetchOutcome::AlreadyPresent);
    }

    #[tokio::test]
    async fn test_fetch_redownloads_corrupt_file() {
        let server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/hello.jar"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"hello"))
            .expect(1)
            .mount(&server)
            .await;

        let target = temp_dir.path().join("hello.jar");
        std::fs::write(&target, b"hel").unwrap();
        let expected = ExpectedDigest::sha256(HELLO_SHA256).unwrap();

        let client = HttpClient::new().unwrap();
        let outcome = client
            .fetch(
                &format!("{}/hello.jar", server.uri()),
                &target,
                Some(&expected),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(!outcome.was_skipped());
        assert_eq!(std::fs::read(&target).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_fetch_digest_mismatch_is_integrity_error() {
        let server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"tampered"))
            .mount(&server)
            .await;

        let target = temp_dir.path().join("hello.jar");
        let expected = ExpectedDigest::sha256(HELLO_SHA256).unwrap();
        let client = HttpClient::new().unwrap();
        let result = client
            .fetch(
                &format!("{}/hello.jar", server.uri()),
                &target,
                Some(&expected),
                &CancellationToken::new(),
            )
            .await;

        match result {
            Err(DownloadError::Integrity {
                expected, actual, ..
            }) => {
                assert_eq!(expected, HELLO_SHA256);
                assert_ne!(actual, HELLO_SHA256);
            }
            other => panic!("Expected Integrity error, got: {other:?}"),
        }
        assert!(target.exists(), "mismatched file stays for inspection");
    }

    #[tokio::test]
    async fn test_fetch_404_is_transport_error() {
        let server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/missing.zip"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let target = temp_dir.path().join("missing.zip");
        let result = client
            .fetch(
                &format!("{}/missing.zip", server.uri()),
                &target,
                None,
                &CancellationToken::new(),
            )
            .await;

        match result {
            Err(DownloadError::HttpStatus { status, target, .. }) => {
                assert_eq!(status, 404);
                assert_eq!(target, "missing.zip");
            }
            other => panic!("Expected HttpStatus error, got: {other:?}"),
        }
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        let temp_dir = TempDir::new().unwrap();
        let client = HttpClient::new().unwrap();
        let result = client
            .fetch(
                "not a url",
                &temp_dir.path().join("x.zip"),
                None,
                &CancellationToken::new(),
            )
            .await;
        assert!(matches!(result, Err(DownloadError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_fetch_cancelled_before_request() {
        let server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"hello"))
            .expect(0)
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let client = HttpClient::new().unwrap();
        let target = temp_dir.path().join("hello.jar");
        let result = client
            .fetch(&format!("{}/hello.jar", server.uri()), &target, None, &cancel)
            .await;
        assert!(result.unwrap_err().is_cancelled());
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_fetch_cancelled_while_waiting_for_response() {
        let server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(vec![0_u8; 1024])
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let client = HttpClient::new().unwrap();
        let target = temp_dir.path().join("slow.tar.bz2");
        let result = client
            .fetch(&format!("{}/slow.tar.bz2", server.uri()), &target, None, &cancel)
            .await;
        assert!(result.unwrap_err().is_cancelled());
        assert!(!target.exists());
    }

    #[test]
    fn test_target_label_uses_file_name() {
        assert_eq!(target_label(Path::new("/work/dir/driver.zip")), "driver.zip");
    }
}
