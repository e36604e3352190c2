//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use testprep::resolver::ResolverEndpoints;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Points both the releases API and the object store at `server`.
pub fn endpoints_for(server: &MockServer) -> ResolverEndpoints {
    ResolverEndpoints {
        github_api_url: server.uri(),
        storage_api_url: server.uri(),
        github_token: None,
    }
}

/// Serves `content` at `path_str`, expecting exactly `hits` requests.
pub async fn mount_file(server: &MockServer, path_str: &str, content: &[u8], hits: u64) {
    Mock::given(method("GET"))
        .and(path(path_str))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .expect(hits)
        .mount(server)
        .await;
}
