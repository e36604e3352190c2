//! Integration tests for the resolver module.
//!
//! Tests the full resolution flow through the public API against mock
//! release and object-store endpoints.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use md5::{Digest, Md5};
use serde_json::json;
use testprep::artifact::{DigestAlgorithm, Locator};
use testprep::resolver::{
    DirectResolver, ResolveError, ResolverRegistry, build_default_resolver_registry,
};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::endpoints_for;

fn registry_for(server: &MockServer) -> ResolverRegistry {
    build_default_resolver_registry(&endpoints_for(server)).unwrap()
}

#[tokio::test]
async fn test_resolver_registry_with_direct_resolver() {
    let mut registry = ResolverRegistry::new();
    registry.register(Box::new(DirectResolver::new()));

    let resolved = registry
        .resolve(&Locator::url("https://example.com/selenium.jar"))
        .await
        .unwrap();
    assert_eq!(resolved.url, "https://example.com/selenium.jar");
}

#[tokio::test]
async fn test_resolver_registry_rejects_release_locator_with_only_direct() {
    let mut registry = ResolverRegistry::new();
    registry.register(Box::new(DirectResolver::new()));

    let err = registry
        .resolve(&Locator::latest_release("mozilla", "geckodriver", "-linux64"))
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::NoResolver { .. }));
    assert!(
        err.to_string().contains("no resolver"),
        "Expected 'no resolver' error, got: {err}"
    );
}

#[tokio::test]
async fn test_latest_release_picks_highest_tag_and_matching_asset() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/mozilla/geckodriver/releases"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "tag_name": "v0.18.0",
                "assets": [
                    {"name": "geckodriver-v0.18.0-linux64.tar.gz",
                     "browser_download_url": "https://dl.example/v0.18.0/geckodriver-v0.18.0-linux64.tar.gz"}
                ]
            },
            {
                "tag_name": "v0.19.1",
                "assets": [
                    {"name": "geckodriver-v0.19.1-macos.tar.gz",
                     "browser_download_url": "https://dl.example/v0.19.1/geckodriver-v0.19.1-macos.tar.gz"},
                    {"name": "geckodriver-v0.19.1-linux64.tar.gz",
                     "browser_download_url": "https://dl.example/v0.19.1/geckodriver-v0.19.1-linux64.tar.gz"}
                ]
            },
            {
                "tag_name": "nightly",
                "assets": [
                    {"name": "geckodriver-nightly-linux64.tar.gz",
                     "browser_download_url": "https://dl.example/nightly/geckodriver-nightly-linux64.tar.gz"}
                ]
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let resolved = registry_for(&server)
        .resolve(&Locator::latest_release("mozilla", "geckodriver", "-linux64"))
        .await
        .unwrap();

    assert_eq!(
        resolved.url,
        "https://dl.example/v0.19.1/geckodriver-v0.19.1-linux64.tar.gz"
    );
    assert_eq!(
        resolved.file_name.as_deref(),
        Some("geckodriver-v0.19.1-linux64.tar.gz")
    );
    assert!(resolved.digest.is_none());
}

#[tokio::test]
async fn test_latest_release_without_matching_asset_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/mozilla/geckodriver/releases"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "tag_name": "v0.19.1",
                "assets": [
                    {"name": "geckodriver-v0.19.1-win64.zip",
                     "browser_download_url": "https://dl.example/geckodriver-v0.19.1-win64.zip"}
                ]
            }
        ])))
        .mount(&server)
        .await;

    let err = registry_for(&server)
        .resolve(&Locator::latest_release("mozilla", "geckodriver", "-linux64"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, ResolveError::NoMatchingAsset { .. }),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn test_latest_release_http_error_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/mozilla/geckodriver/releases"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = registry_for(&server)
        .resolve(&Locator::latest_release("mozilla", "geckodriver", "-linux64"))
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::HttpStatus { .. }), "unexpected error: {err}");
    assert!(err.to_string().contains("403"));
}

#[tokio::test]
async fn test_object_listing_follows_pages_and_picks_highest_version() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/storage/v1/b/selenium-release/o"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"name": "3.4/selenium-server-standalone-3.4.0.jar",
                 "mediaLink": "https://dl.example/3.4/selenium-server-standalone-3.4.0.jar"},
                {"name": "3.4/selenium-java-3.4.0.zip"}
            ],
            "nextPageToken": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/storage/v1/b/selenium-release/o"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"name": "3.14/selenium-server-standalone-3.14.0.jar",
                 "mediaLink": "https://dl.example/3.14/selenium-server-standalone-3.14.0.jar",
                 "md5Hash": "1B2M2Y8AsgTpgAmY7PhCfg=="},
                {"name": "3.9/selenium-server-standalone-3.9.1.jar",
                 "mediaLink": "https://dl.example/3.9/selenium-server-standalone-3.9.1.jar"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resolved = registry_for(&server)
        .resolve(&Locator::object_listing(
            "selenium-release",
            "selenium-server-standalone-",
            ".jar",
        ))
        .await
        .unwrap();

    assert_eq!(
        resolved.url,
        "https://dl.example/3.14/selenium-server-standalone-3.14.0.jar"
    );
    assert_eq!(
        resolved.file_name.as_deref(),
        Some("selenium-server-standalone-3.14.0.jar")
    );
    let digest = resolved.digest.unwrap();
    assert_eq!(digest.algorithm(), DigestAlgorithm::Md5);
    // MD5 of the empty string.
    assert_eq!(digest.hex(), "d41d8cd98f00b204e9800998ecf8427e");
}

#[tokio::test]
async fn test_object_listing_without_candidates_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/storage/v1/b/selenium-release/o"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"name": "3.4/selenium-java-3.4.0.zip"}]
        })))
        .mount(&server)
        .await;

    let err = registry_for(&server)
        .resolve(&Locator::object_listing(
            "selenium-release",
            "selenium-server-standalone-",
            ".jar",
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::NoRelease { .. }), "unexpected error: {err}");
}

#[tokio::test]
async fn test_pointer_object_resolves_build_and_md5() {
    let server = MockServer::start().await;

    let archive = b"fake chrome build";
    let md5 = Md5::digest(archive);

    Mock::given(method("GET"))
        .and(path(
            "/storage/v1/b/chromium-browser-snapshots/o/Linux_x64%2FLAST_CHANGE",
        ))
        .and(query_param("alt", "media"))
        .respond_with(ResponseTemplate::new(200).set_body_string("498567\n"))
        .expect(1)
        .mount(&server)
        .await;

    let media_link = format!("{}/download/chrome-linux.zip", server.uri());
    Mock::given(method("GET"))
        .and(path(
            "/storage/v1/b/chromium-browser-snapshots/o/Linux_x64%2F498567%2Fchrome-linux.zip",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Linux_x64/498567/chrome-linux.zip",
            "mediaLink": media_link,
            "md5Hash": BASE64.encode(md5),
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resolved = registry_for(&server)
        .resolve(&Locator::object_pointer(
            "chromium-browser-snapshots",
            "Linux_x64/LAST_CHANGE",
            "Linux_x64",
            "chrome-linux.zip",
        ))
        .await
        .unwrap();

    assert_eq!(resolved.url, media_link);
    assert_eq!(resolved.file_name.as_deref(), Some("chrome-linux.zip"));
    let digest = resolved.digest.unwrap();
    assert_eq!(digest.algorithm(), DigestAlgorithm::Md5);
    assert_eq!(digest.hex(), hex::encode(md5));
}

#[tokio::test]
async fn test_empty_pointer_object_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(
            "/storage/v1/b/chromium-browser-snapshots/o/Linux_x64%2FLAST_CHANGE",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string("  \n"))
        .mount(&server)
        .await;

    let err = registry_for(&server)
        .resolve(&Locator::object_pointer(
            "chromium-browser-snapshots",
            "Linux_x64/LAST_CHANGE",
            "Linux_x64",
            "chrome-linux.zip",
        ))
        .await
        .unwrap_err();
    assert!(
        matches!(err, ResolveError::PointerUnreadable { .. }),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn test_missing_pointer_object_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(
            "/storage/v1/b/chromium-browser-snapshots/o/Linux_x64%2FLAST_CHANGE",
        ))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = registry_for(&server)
        .resolve(&Locator::object_pointer(
            "chromium-browser-snapshots",
            "Linux_x64/LAST_CHANGE",
            "Linux_x64",
            "chrome-linux.zip",
        ))
        .await
        .unwrap_err();
    assert!(
        matches!(err, ResolveError::PointerUnreadable { .. }),
        "unexpected error: {err}"
    );
}
