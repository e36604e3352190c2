//! Object-store resolvers backed by the cloud storage JSON API.
//!
//! Two lookup styles are supported:
//!
//! - [`PointerResolver`] reads a small pointer object whose content names a
//!   build directory, then fetches the metadata of
//!   `<platform_prefix>/<pointer content>/<file_name>`.
//! - [`ObjectListingResolver`] pages through every object in a bucket, keeps
//!   the ones named `…<file_prefix><version><file_suffix>`, and picks the
//!   highest version.
//!
//! Both return the object's direct media link as the download URL and its
//! MD5 as the expected digest, so the download can be verified without a
//! second lookup.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::artifact::{ExpectedDigest, Locator};

use super::http_client::{build_resolver_http_client, get_json, get_text};
use super::version::{parse_tolerant, pick_latest};
use super::{ResolveError, ResolvedUrl, Resolver};

/// Default object-store API base URL.
pub const DEFAULT_STORAGE_API_URL: &str = "https://storage.googleapis.com";

/// Metadata for a single stored object.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadata {
    /// Full object name, possibly containing `/`.
    pub name: String,
    /// Direct download link for the object's bytes.
    #[serde(default)]
    pub media_link: Option<String>,
    /// Base64-encoded MD5 of the object content.
    #[serde(default)]
    pub md5_hash: Option<String>,
}

impl ObjectMetadata {
    /// Last `/`-separated segment of the object name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// The object's MD5 as an expected digest, if reported and well-formed.
    #[must_use]
    pub fn md5_digest(&self) -> Option<ExpectedDigest> {
        let encoded = self.md5_hash.as_deref()?;
        let bytes = match BASE64.decode(encoded) {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!(object = %self.name, error = %error, "Ignoring undecodable md5Hash");
                return None;
            }
        };
        match ExpectedDigest::md5(hex::encode(bytes)) {
            Ok(digest) => Some(digest),
            Err(error) => {
                warn!(object = %self.name, error = %error, "Ignoring malformed md5Hash");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectPage {
    #[serde(default)]
    items: Vec<ObjectMetadata>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Minimal client for the object-store JSON API.
pub struct ObjectStoreClient {
    client: Client,
    base_url: String,
}

impl ObjectStoreClient {
    /// Creates a client against `base_url`, normally
    /// [`DEFAULT_STORAGE_API_URL`] or a mock server.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Unavailable`] if HTTP client construction fails.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ResolveError> {
        Ok(Self {
            client: build_resolver_http_client("object-store", None)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn object_url(&self, bucket: &str, name: &str) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}",
            self.base_url,
            urlencoding::encode(bucket),
            urlencoding::encode(name)
        )
    }

    /// URL that serves an object's bytes, used when metadata has no media link.
    #[must_use]
    pub fn media_url(&self, bucket: &str, name: &str) -> String {
        format!("{}?alt=media", self.object_url(bucket, name))
    }

    /// Reads an object's full content as text.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] on transport failure or non-success status.
    #[tracing::instrument(skip(self))]
    pub async fn read_object(&self, bucket: &str, name: &str) -> Result<String, ResolveError> {
        let url = self.media_url(bucket, name);
        get_text(&self.client, &url, &format!("gs://{bucket}/{name}")).await
    }

    /// Fetches an object's metadata.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] on transport failure, non-success status or
    /// an undecodable body.
    #[tracing::instrument(skip(self))]
    pub async fn object_metadata(
        &self,
        bucket: &str,
        name: &str,
    ) -> Result<ObjectMetadata, ResolveError> {
        let url = self.object_url(bucket, name);
        get_json(&self.client, &url, None, &format!("gs://{bucket}/{name}")).await
    }

    /// Lists every object in `bucket`, following page tokens until exhausted.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] if any page request fails.
    #[tracing::instrument(skip(self))]
    pub async fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectMetadata>, ResolveError> {
        let context = format!("gs://{bucket}");
        let list_url = format!("{}/storage/v1/b/{}/o", self.base_url, urlencoding::encode(bucket));
        let mut objects = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut url = Url::parse(&list_url)
                .map_err(|_| ResolveError::invalid_url(&context, &list_url))?;
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }
            let page: ObjectPage = get_json(&self.client, url.as_str(), None, &context).await?;
            pages += 1;
            objects.extend(page.items);
            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(bucket, pages, objects = objects.len(), "Listed bucket");
        Ok(objects)
    }
}

impl std::fmt::Debug for ObjectStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStoreClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn resolved_from_metadata(
    store: &ObjectStoreClient,
    bucket: &str,
    object: &ObjectMetadata,
) -> Result<ResolvedUrl, ResolveError> {
    let url = object
        .media_link
        .clone()
        .unwrap_or_else(|| store.media_url(bucket, &object.name));
    if Url::parse(&url).is_err() {
        return Err(ResolveError::invalid_url(&format!("gs://{bucket}"), &url));
    }
    Ok(ResolvedUrl {
        url,
        file_name: Some(object.file_name().to_string()),
        digest: object.md5_digest(),
    })
}

/// Joins object path segments with `/`, dropping empty segments and stray slashes.
fn join_object_path(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|segment| segment.trim_matches('/'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Resolves [`Locator::ObjectPointer`] by dereferencing a pointer object.
#[derive(Debug)]
pub struct PointerResolver {
    store: Arc<ObjectStoreClient>,
}

impl PointerResolver {
    /// Creates a resolver sharing `store`.
    #[must_use]
    pub fn new(store: Arc<ObjectStoreClient>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Resolver for PointerResolver {
    fn name(&self) -> &'static str {
        "object-pointer"
    }

    fn can_handle(&self, locator: &Locator) -> bool {
        matches!(locator, Locator::ObjectPointer { .. })
    }

    #[tracing::instrument(skip(self), fields(resolver = "object-pointer"))]
    async fn resolve(&self, locator: &Locator) -> Result<ResolvedUrl, ResolveError> {
        let Locator::ObjectPointer {
            bucket,
            pointer_object,
            platform_prefix,
            file_name,
        } = locator
        else {
            return Err(ResolveError::no_resolver(locator));
        };

        let content = self
            .store
            .read_object(bucket, pointer_object)
            .await
            .map_err(|e| ResolveError::pointer_unreadable(bucket, pointer_object, e))?;
        let build = content.trim();
        if build.is_empty() {
            return Err(ResolveError::pointer_unreadable(
                bucket,
                pointer_object,
                "pointer object is empty",
            ));
        }

        let object_path = join_object_path(&[platform_prefix.as_str(), build, file_name.as_str()]);
        debug!(bucket = %bucket, build, object = %object_path, "Dereferenced pointer object");

        let metadata = self.store.object_metadata(bucket, &object_path).await?;
        let resolved = resolved_from_metadata(&self.store, bucket, &metadata)?;
        info!(
            bucket = %bucket,
            object = %object_path,
            url = %resolved.url,
            "Resolved pointer object"
        );
        Ok(resolved)
    }
}

/// Resolves [`Locator::ObjectListing`] by picking the highest-versioned object.
#[derive(Debug)]
pub struct ObjectListingResolver {
    store: Arc<ObjectStoreClient>,
}

impl ObjectListingResolver {
    /// Creates a resolver sharing `store`.
    #[must_use]
    pub fn new(store: Arc<ObjectStoreClient>) -> Self {
        Self { store }
    }
}

/// Picks the object whose embedded version is strictly greatest.
///
/// Object names must contain `file_prefix` and end with `file_suffix`; the text
/// between them is parsed as a version. Names that do not fit or whose version
/// does not parse are skipped.
#[must_use]
pub fn select_latest_object<'a>(
    bucket: &str,
    file_prefix: &str,
    file_suffix: &str,
    objects: &'a [ObjectMetadata],
) -> Option<&'a ObjectMetadata> {
    let candidates = objects.iter().filter_map(|object| {
        let start = object.name.find(file_prefix)? + file_prefix.len();
        let Some(version_text) = object.name[start..].strip_suffix(file_suffix) else {
            debug!(bucket, object = %object.name, "Skipping object without expected suffix");
            return None;
        };
        match parse_tolerant(version_text) {
            Ok(version) => Some((version, object)),
            Err(error) => {
                debug!(
                    bucket,
                    object = %object.name,
                    error = %error,
                    "Skipping object with unparseable version"
                );
                None
            }
        }
    });
    pick_latest(candidates).map(|(_, object)| object)
}

#[async_trait]
impl Resolver for ObjectListingResolver {
    fn name(&self) -> &'static str {
        "object-listing"
    }

    fn can_handle(&self, locator: &Locator) -> bool {
        matches!(locator, Locator::ObjectListing { .. })
    }

    #[tracing::instrument(skip(self), fields(resolver = "object-listing"))]
    async fn resolve(&self, locator: &Locator) -> Result<ResolvedUrl, ResolveError> {
        let Locator::ObjectListing {
            bucket,
            file_prefix,
            file_suffix,
        } = locator
        else {
            return Err(ResolveError::no_resolver(locator));
        };

        let objects = self.store.list_objects(bucket).await?;
        let Some(latest) = select_latest_object(bucket, file_prefix, file_suffix, &objects) else {
            return Err(ResolveError::no_release(&format!(
                "gs://{bucket} objects named *{file_prefix}<version>{file_suffix}"
            )));
        };
        let resolved = resolved_from_metadata(&self.store, bucket, latest)?;
        info!(
            bucket = %bucket,
            object = %latest.name,
            url = %resolved.url,
            "Resolved latest object"
        );
        Ok(resolved)
    }
}
