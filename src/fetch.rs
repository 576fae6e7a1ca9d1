//! Network fetching
//!
//! The network seam of the cache manager and its reqwest-backed implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{redirect, Client};
use tracing::debug;
use url::Url;

use crate::error::{CacheError, Result};
use crate::models::{FetchRequest, FetchResponse, ResponseType};

/// Performs network requests.
///
/// A returned error means the request never produced a response (offline,
/// refused, timed out). HTTP error statuses are successful fetches.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse>;
}

/// HTTP client for fetching from the upstream origin
pub struct HttpFetcher {
    client: Client,
    origin: Url,
}

impl HttpFetcher {
    /// Create a fetcher whose same-origin responses are those from `origin`.
    pub fn new(origin: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::limited(10))
            .build()?;

        Ok(Self { client, origin })
    }

    fn response_type(&self, final_url: &Url) -> ResponseType {
        if final_url.origin() == self.origin.origin() {
            ResponseType::Basic
        } else {
            ResponseType::Cors
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        debug!(method = %request.method, url = %request.url, "Fetching from network");

        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .body(request.body.clone())
            .send()
            .await?;

        let kind = self.response_type(response.url());
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        debug!(status = %status, size = body.len(), "Fetched from network");

        Ok(FetchResponse {
            status,
            headers,
            body,
            kind,
        })
    }
}

impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("origin", &self.origin.as_str())
            .finish()
    }
}

/// Builds the upstream URL for a proxied path and query.
///
/// The path is always placed on `origin`; a target such as `//host/x` stays
/// a path on the origin instead of naming another host.
pub fn upstream_url(origin: &Url, path_and_query: &str) -> Result<Url> {
    if !path_and_query.starts_with('/') {
        return Err(CacheError::Internal(format!(
            "Invalid upstream path '{}': must start with '/'",
            path_and_query
        )));
    }

    let (path, query) = match path_and_query.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path_and_query, None),
    };

    let mut url = origin.clone();
    url.set_path(path);
    url.set_query(query);
    url.set_fragment(None);
    Ok(url)
}
