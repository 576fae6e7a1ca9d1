//! Request Classification
//!
//! Decides which caching strategy applies to a request, and whether a
//! network response may be written to the runtime store.

use std::sync::LazyLock;

use axum::http::{header, Method, StatusCode};
use regex::Regex;

use crate::models::{FetchRequest, FetchResponse, ResponseType};
use crate::policy::PWA_ICON_PATH;

/// Cache-Control substrings that bypass caching entirely.
const SKIP_DIRECTIVES: [&str; 3] = ["no-store", "immutable", "max-age=31536000"];

const FONT_EXTENSIONS: [&str; 3] = [".woff", ".woff2", ".ttf"];

const STATIC_BUNDLE_MARKER: &str = "/_next/static/";
const WEB_MANIFEST_PATH: &str = "/manifest.webmanifest";
const API_SEGMENT: &str = "/api/";

/// URLs that are never written to the runtime store: screenshots, framework
/// debug stack frames, profile pictures, news images and video thumbnails.
static BLACKLIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(/screenshots?/|__nextjs_original-stack-frame|/profile[-_]pictures?/|/news/images?/|ytimg\.com)",
    )
    .unwrap()
});

// == Request Class ==
/// Strategy selected from the request alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Straight to the network, no cache read or write
    Skip,
    /// Stale-while-revalidate over the static store
    StaticAsset,
    /// Network-first over the runtime store
    Dynamic,
}

// == Classification ==
/// Verdict over a request and, for dynamic requests, its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Skip,
    StaticAsset,
    Cacheable,
    NotCacheable,
}

/// Classifies a request. Rules are evaluated in order, first match wins.
pub fn classify(request: &FetchRequest) -> RequestClass {
    if has_skip_directive(request) {
        return RequestClass::Skip;
    }
    if is_static_asset(request.path()) {
        return RequestClass::StaticAsset;
    }
    RequestClass::Dynamic
}

/// Full verdict for a completed exchange.
pub fn classify_exchange(request: &FetchRequest, response: &FetchResponse) -> Classification {
    match classify(request) {
        RequestClass::Skip => Classification::Skip,
        RequestClass::StaticAsset => Classification::StaticAsset,
        RequestClass::Dynamic if is_cacheable(request, response) => Classification::Cacheable,
        RequestClass::Dynamic => Classification::NotCacheable,
    }
}

/// Whether a dynamic response may be stored in the runtime store.
pub fn is_cacheable(request: &FetchRequest, response: &FetchResponse) -> bool {
    response.status == StatusCode::OK
        && response.kind == ResponseType::Basic
        && is_cacheable_request(request)
        && !carries_credentials(request)
}

/// Request-side half of [`is_cacheable`]. A request failing it never reads
/// from or writes to the runtime store.
pub fn is_cacheable_request(request: &FetchRequest) -> bool {
    matches!(request.url.scheme(), "http" | "https")
        && !request.url.as_str().contains(API_SEGMENT)
        && request.method == Method::GET
        && !is_blacklisted(request.url.as_str())
}

/// Requests carrying a session or credentials get per-user responses.
fn carries_credentials(request: &FetchRequest) -> bool {
    request.headers.contains_key(header::COOKIE)
        || request.headers.contains_key(header::AUTHORIZATION)
}

pub fn is_blacklisted(url: &str) -> bool {
    BLACKLIST.is_match(url)
}

fn has_skip_directive(request: &FetchRequest) -> bool {
    request
        .cache_control()
        .map(|value| {
            let value = value.to_ascii_lowercase();
            SKIP_DIRECTIVES.iter().any(|d| value.contains(d))
        })
        .unwrap_or(false)
}

fn is_static_asset(path: &str) -> bool {
    FONT_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
        || path.contains(STATIC_BUNDLE_MARKER)
        || path == WEB_MANIFEST_PATH
        || path == PWA_ICON_PATH
}
