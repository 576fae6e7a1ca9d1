//! Fetch value types
//!
//! Request and response descriptors that flow between the proxy surface,
//! the cache manager and the network fetcher.

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::Response,
};
use url::Url;

use crate::error::{CacheError, Result};

// == Response Type ==
/// Origin classification of a fetched response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    /// Same-origin response
    Basic,
    /// Cross-origin response
    Cors,
    /// Produced locally (offline fallback or synthetic error)
    Synthetic,
}

/// Connection-scoped headers that are never forwarded in either direction.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

// == Fetch Request ==

/// An outbound request descriptor.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl FetchRequest {
    /// Creates a request with an empty body and no headers.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Parses `url` and creates a GET request for it.
    pub fn get(url: &str) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| CacheError::Internal(format!("Invalid URL '{}': {}", url, e)))?;
        Ok(Self::new(Method::GET, url))
    }

    /// Adds a header, ignoring values that are not valid header text.
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Returns the Cache-Control request header, if readable.
    pub fn cache_control(&self) -> Option<&str> {
        self.headers
            .get(header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }
}

// == Fetch Response ==
/// A response snapshot with a fully buffered body.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub kind: ResponseType,
}

impl FetchResponse {
    /// Creates a same-origin response.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
            kind: ResponseType::Basic,
        }
    }

    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Synthetic 503 returned when neither network nor cache can answer.
    pub fn service_unavailable() -> Self {
        let mut response = Self::new(StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable");
        response.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response.kind = ResponseType::Synthetic;
        response
    }

    pub fn with_kind(mut self, kind: ResponseType) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Returns a header value as text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Converts into an axum response for the proxy surface.
    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        for (name, value) in self.headers.iter() {
            // Length is recomputed by the server
            if is_hop_by_hop(name) || name == header::CONTENT_LENGTH {
                continue;
            }
            response.headers_mut().append(name.clone(), value.clone());
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_parses_url() {
        let req = FetchRequest::get("https://example.org/en/events?page=2").unwrap();
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.path(), "/en/events");
    }

    #[test]
    fn test_get_rejects_invalid_url() {
        assert!(FetchRequest::get("not a url").is_err());
    }

    #[test]
    fn test_cache_control_header() {
        let req = FetchRequest::get("https://example.org/")
            .unwrap()
            .with_header(header::CACHE_CONTROL, "no-store");
        assert_eq!(req.cache_control(), Some("no-store"));
    }

    #[test]
    fn test_service_unavailable() {
        let res = FetchResponse::service_unavailable();
        assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(res.kind, ResponseType::Synthetic);
        assert_eq!(res.header("content-type"), Some("text/plain; charset=utf-8"));
    }

    #[test]
    fn test_into_response_keeps_headers() {
        let res = FetchResponse::ok("hello")
            .with_header(header::CONTENT_TYPE, "text/html")
            .into_response();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "text/html");
    }

    #[test]
    fn test_into_response_drops_hop_by_hop() {
        let res = FetchResponse::ok("hello")
            .with_header(header::CONNECTION, "keep-alive")
            .with_header(header::UPGRADE, "websocket")
            .with_header(HeaderName::from_static("keep-alive"), "timeout=5")
            .into_response();

        assert!(res.headers().get(header::CONNECTION).is_none());
        assert!(res.headers().get(header::UPGRADE).is_none());
        assert!(res.headers().get("keep-alive").is_none());
    }

    #[test]
    fn test_is_hop_by_hop() {
        assert!(is_hop_by_hop(&header::TE));
        assert!(is_hop_by_hop(&header::TRANSFER_ENCODING));
        assert!(!is_hop_by_hop(&header::CONTENT_TYPE));
        assert!(!is_hop_by_hop(&header::COOKIE));
    }
}
