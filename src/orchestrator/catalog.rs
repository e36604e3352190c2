//! Built-in artifact catalog for the integration test environment.

use crate::artifact::{
    ArtifactDescriptor, DescriptorError, DescriptorSet, ExpectedDigest, Locator, RenamePair,
};

const SELENIUM_SERVER_URL: &str =
    "http://selenium-release.storage.googleapis.com/3.4/selenium-server-standalone-3.4.0.jar";
const SELENIUM_SERVER_SHA256: &str =
    "21cbbd775678821b6b72c208b8d59664a4c7381b3c50b008b331914d2834ec8d";

const CHROMEDRIVER_URL: &str =
    "https://chromedriver.storage.googleapis.com/2.31/chromedriver_linux64.zip";
const CHROMEDRIVER_SHA256: &str =
    "3e372ef676beb3a03aba72089ec0624bb9d3b52597635f907d4c23390fb485a0";

// A recent nightly; bump periodically.
const FIREFOX_NIGHTLY_URL: &str = "https://archive.mozilla.org/pub/firefox/nightly/2017/08/2017-08-21-10-03-50-mozilla-central/firefox-57.0a1.en-US.linux-x86_64.tar.bz2";
const FIREFOX_NIGHTLY_SHA256: &str =
    "77c57356935f66a5a59b1b2cffeaa53b70204195e6a7b15ee828fd3308561e46";

const SAUCE_CONNECT_URL: &str = "https://saucelabs.com/downloads/sc-4.4.9-linux.tar.gz";
const SAUCE_CONNECT_SHA256: &str =
    "b1bedccc2690b48d6708ac71f23189c85b0da62c56ee943a1b20d8f17fa8bbde";

/// Returns the descriptors the integration tests need.
///
/// Pinned artifacts carry SHA-256 digests. The latest geckodriver and Selenium
/// server are looked up at run time, as is the latest Chromium snapshot, which
/// is verified with the MD5 the object store reports.
///
/// # Errors
///
/// Returns a [`DescriptorError`] if a pinned digest, name or rename is
/// malformed.
pub fn default_descriptors() -> Result<DescriptorSet, DescriptorError> {
    DescriptorSet::new(vec![
        ArtifactDescriptor::new(Locator::url(SELENIUM_SERVER_URL))
            .named("selenium-server-standalone-3.4.jar")
            .with_digest(ExpectedDigest::sha256(SELENIUM_SERVER_SHA256)?),
        ArtifactDescriptor::new(Locator::url(CHROMEDRIVER_URL))
            .named("chromedriver_2.31_linux64.zip")
            .with_digest(ExpectedDigest::sha256(CHROMEDRIVER_SHA256)?)
            .with_rename(RenamePair::from_slice(&["chromedriver", "chromedriver-linux64-2.31"])?),
        ArtifactDescriptor::new(Locator::url(FIREFOX_NIGHTLY_URL))
            .named("firefox-57.0a1.en-US.linux-x86_64.tar.bz2")
            .with_digest(ExpectedDigest::sha256(FIREFOX_NIGHTLY_SHA256)?)
            .with_rename(RenamePair::from_slice(&["firefox", "firefox-nightly"])?)
            .browser_only(),
        ArtifactDescriptor::new(Locator::url(SAUCE_CONNECT_URL))
            .named("sauce-connect-4.4.9-linux.tar.gz")
            .with_digest(ExpectedDigest::sha256(SAUCE_CONNECT_SHA256)?)
            .with_rename(RenamePair::from_slice(&["sc-4.4.9-linux", "sauce-connect"])?),
        ArtifactDescriptor::new(Locator::latest_release("mozilla", "geckodriver", "-linux64")),
        ArtifactDescriptor::new(Locator::object_listing(
            "selenium-release",
            "selenium-server-standalone-",
            ".jar",
        )),
        ArtifactDescriptor::new(Locator::object_pointer(
            "chromium-browser-snapshots",
            "Linux_x64/LAST_CHANGE",
            "Linux_x64",
            "chrome-linux.zip",
        ))
        .named("chrome-linux.zip")
        .browser_only(),
    ])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_descriptors_build() {
        let set = default_descriptors().unwrap();
        assert_eq!(set.len(), 7);
        let browser_only: Vec<String> = set
            .iter()
            .filter(|d| d.browser_only)
            .map(ArtifactDescriptor::label)
            .collect();
        assert_eq!(
            browser_only,
            vec![
                "firefox-57.0a1.en-US.linux-x86_64.tar.bz2".to_string(),
                "chrome-linux.zip".to_string()
            ]
        );
    }

    #[test]
    fn test_pinned_artifacts_carry_digests() {
        let set = default_descriptors().unwrap();
        for descriptor in set.iter() {
            if matches!(descriptor.locator, Locator::Static { .. }) {
                assert!(
                    descriptor.expected_digest.is_some(),
                    "{} has no digest",
                    descriptor.label()
                );
            }
        }
    }

    #[test]
    fn test_archives_declare_their_renames() {
        let set = default_descriptors().unwrap();
        let renames: Vec<(String, String)> = set
            .iter()
            .filter_map(|d| d.rename.as_ref())
            .map(|r| {
                (
                    r.produced().display().to_string(),
                    r.desired().display().to_string(),
                )
            })
            .collect();
        assert_eq!(
            renames,
            vec![
                ("chromedriver".to_string(), "chromedriver-linux64-2.31".to_string()),
                ("firefox".to_string(), "firefox-nightly".to_string()),
                ("sc-4.4.9-linux".to_string(), "sauce-connect".to_string()),
            ]
        );
    }
}
