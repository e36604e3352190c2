//! Shared HTTP client construction and request helpers for resolvers.
//!
//! Resolver lookups are small JSON/text requests, so they get shorter
//! timeouts than bulk downloads. All resolvers send the same User-Agent.

use std::sync::RwLock;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::user_agent;

use super::ResolveError;

/// Default resolver connect timeout.
pub const CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default resolver request timeout.
///
/// Unlike the download read timeout, this bounds the whole request: connect,
/// headers and body together.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy)]
struct ResolverHttpTimeouts {
    connect_timeout_secs: u64,
    request_timeout_secs: u64,
}

impl Default for ResolverHttpTimeouts {
    fn default() -> Self {
        Self {
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
        }
    }
}

static RESOLVER_HTTP_TIMEOUTS: RwLock<ResolverHttpTimeouts> = RwLock::new(ResolverHttpTimeouts {
    connect_timeout_secs: CONNECT_TIMEOUT_SECS,
    request_timeout_secs: REQUEST_TIMEOUT_SECS,
});

/// Configures resolver HTTP timeouts used by resolver client builders.
///
/// `request_timeout_secs` caps each resolver request end to end, so a
/// lookup that trickles its body in still fails once it is exceeded.
/// Intended for CLI/runtime configuration before resolver construction.
pub fn configure_resolver_http_timeouts(connect_timeout_secs: u64, request_timeout_secs: u64) {
    if let Ok(mut guard) = RESOLVER_HTTP_TIMEOUTS.write() {
        *guard = ResolverHttpTimeouts {
            connect_timeout_secs,
            request_timeout_secs,
        };
    }
}

fn resolver_http_timeouts() -> ResolverHttpTimeouts {
    RESOLVER_HTTP_TIMEOUTS
        .read()
        .map(|guard| *guard)
        .unwrap_or_default()
}

/// Builds a resolver HTTP client using the shared timeout and User-Agent policy.
///
/// `bearer_token`, when present, is sent as an `Authorization` header on every
/// request (used to lift release API rate limits).
///
/// # Errors
///
/// Returns [`ResolveError::Unavailable`] when client construction fails.
pub fn build_resolver_http_client(
    resolver_name: &str,
    bearer_token: Option<&str>,
) -> Result<Client, ResolveError> {
    client_with_timeouts(resolver_name, bearer_token, resolver_http_timeouts())
}

fn client_with_timeouts(
    resolver_name: &str,
    bearer_token: Option<&str>,
    timeouts: ResolverHttpTimeouts,
) -> Result<Client, ResolveError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = bearer_token {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| ResolveError::unavailable(resolver_name, e))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_timeout_secs))
        .timeout(Duration::from_secs(timeouts.request_timeout_secs))
        .user_agent(user_agent::default_user_agent())
        .default_headers(headers)
        .build()
        .map_err(|e| {
            ResolveError::unavailable(
                resolver_name,
                format!("HTTP client construction failed: {e}"),
            )
        })
}

/// Sends a GET request and returns the successful response.
///
/// `context` names the project or bucket being looked up and is attached to
/// any error.
pub(crate) async fn get_ok(
    client: &Client,
    url: &str,
    accept: Option<&'static str>,
    context: &str,
) -> Result<reqwest::Response, ResolveError> {
    debug!(url = %url, context, "resolver request");
    let mut request = client.get(url);
    if let Some(accept) = accept {
        request = request.header(ACCEPT, accept);
    }
    let response = request
        .send()
        .await
        .map_err(|e| ResolveError::request(context, url, e))?;
    let status = response.status();
    if !status.is_success() {
        return Err(ResolveError::http_status(context, url, status.as_u16()));
    }
    Ok(response)
}

/// Sends a GET request and decodes the JSON body as `T`.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    accept: Option<&'static str>,
    context: &str,
) -> Result<T, ResolveError> {
    get_ok(client, url, accept, context)
        .await?
        .json::<T>()
        .await
        .map_err(|e| ResolveError::request(context, url, format!("invalid response body: {e}")))
}

/// Sends a GET request and returns the body as text.
pub(crate) async fn get_text(
    client: &Client,
    url: &str,
    context: &str,
) -> Result<String, ResolveError> {
    get_ok(client, url, None, context)
        .await?
        .text()
        .await
        .map_err(|e| ResolveError::request(context, url, e))
}
