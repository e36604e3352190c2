//! Constants for the download module.

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes; browser builds are large).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Buffer size for the streamed writer.
pub(crate) const WRITE_BUFFER_BYTES: usize = 64 * 1024;
