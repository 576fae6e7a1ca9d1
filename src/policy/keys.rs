//! Cache key normalization and offline page selection.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Locales served by the portal. The second one is the fallback.
pub const LOCALES: [&str; 2] = ["en", "sv"];

/// Trailing partial-render query parameter.
static PARTIAL_RENDER_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]_rsc=[^&]*$").unwrap());

/// Normalized cache key for a request URL.
///
/// Only a trailing `_rsc` parameter is stripped. Other query strings are kept
/// verbatim, so each distinct variant gets its own key.
pub fn cache_key(url: &Url) -> String {
    PARTIAL_RENDER_SUFFIX.replace(url.as_str(), "").into_owned()
}

/// Locale selected by the first path segment, or the fallback locale.
pub fn locale_for_path(path: &str) -> &'static str {
    let first = path.trim_start_matches('/').split('/').next().unwrap_or("");
    LOCALES
        .iter()
        .find(|locale| **locale == first)
        .copied()
        .unwrap_or(LOCALES[1])
}

/// Path of the precached offline page for `locale`.
pub fn offline_page_path(locale: &str) -> String {
    format!("/{}/~offline", locale)
}
