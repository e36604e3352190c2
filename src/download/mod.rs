//! HTTP download worker for streaming artifacts to disk.
//!
//! # Features
//!
//! - Streaming downloads (memory-efficient for browser-sized archives)
//! - Digest computed in the same pass as the write
//! - Pre-check that skips the network when the target is already valid
//! - Configurable timeouts (30s connect, 5min read by default)
//! - Cooperative cancellation between body chunks
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use testprep::artifact::ExpectedDigest;
//! use testprep::download::HttpClient;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new()?;
//! let digest = ExpectedDigest::sha256(
//!     "21cbbd775678821b6b72c208b8d59664a4c7381b3c50b008b331914d2834ec8d",
//! )?;
//! client
//!     .fetch(
//!         "https://selenium-release.storage.googleapis.com/3.4/selenium-server-standalone-3.4.0.jar",
//!         Path::new("selenium-server-standalone-3.4.jar"),
//!         Some(&digest),
//!         &CancellationToken::new(),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;

pub use client::{FetchOutcome, HttpClient};
pub use constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
pub use error::DownloadError;
