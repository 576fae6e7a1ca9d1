//! Cache Entry Module
//!
//! Stored response snapshots and the timestamp header used for runtime
//! eviction.

use axum::{
    body::Bytes,
    http::{header, HeaderMap, HeaderValue, StatusCode},
};
use chrono::{DateTime, Duration, Utc};

use crate::cache::TIMESTAMP_HEADER;
use crate::models::{FetchResponse, ResponseType};

// == Cached Response ==
/// A response snapshot held in a cache store.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CachedResponse {
    // == Constructor ==
    /// Snapshots a fetched response. The body is shared, not copied.
    ///
    /// `Set-Cookie` is dropped: a stored snapshot may be replayed to any client.
    pub fn from_response(response: &FetchResponse) -> Self {
        let mut headers = response.headers.clone();
        headers.remove(header::SET_COOKIE);

        Self {
            status: response.status,
            headers,
            body: response.body.clone(),
        }
    }

    // == Stamping ==
    /// Returns this entry with the cache timestamp header set to `at`.
    ///
    /// Any previous stamp is replaced, so re-caching a key keeps only the
    /// most recent time.
    pub fn stamped(mut self, at: DateTime<Utc>) -> Self {
        let value = HeaderValue::from(at.timestamp_millis());
        self.headers.insert(TIMESTAMP_HEADER, value);
        self
    }

    /// Reads the cache timestamp header, if present and well formed.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.headers
            .get(TIMESTAMP_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
            .and_then(DateTime::from_timestamp_millis)
    }

    /// Age of the entry at `now`; None for unstamped entries.
    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.timestamp().map(|stamped_at| now - stamped_at)
    }

    // == Sentinel ==
    /// Builds the pseudo-entry that persists the last sweep time.
    pub fn sentinel(at: DateTime<Utc>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::from(at.timestamp_millis().to_string()),
        }
    }

    /// Reads the time stored in a sentinel entry body.
    pub fn sentinel_time(&self) -> Option<DateTime<Utc>> {
        std::str::from_utf8(&self.body)
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .and_then(DateTime::from_timestamp_millis)
    }

    // == Conversion ==
    /// Rebuilds a same-origin response from this snapshot.
    pub fn to_response(&self) -> FetchResponse {
        FetchResponse {
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
            kind: ResponseType::Basic,
        }
    }
}
