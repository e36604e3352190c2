//! Shared User-Agent string for download and resolver HTTP clients.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/tebeka/selenium";

/// User-Agent sent on every request. Release APIs reject requests without one.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("testprep/{version} (test-setup-tool; +{PROJECT_UA_URL})")
}
