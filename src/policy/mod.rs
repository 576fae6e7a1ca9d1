//! Caching Policy Module
//!
//! Request classification, the URL blacklist, cache key normalization and
//! the precache manifest.

mod classify;
mod keys;


pub use classify::{
    classify, classify_exchange, is_blacklisted, is_cacheable, is_cacheable_request,
    Classification, RequestClass,
};
pub use keys::{cache_key, locale_for_path, offline_page_path, LOCALES};

// == Public Constants ==
/// Fixed PWA icon served from the static store
pub const PWA_ICON_PATH: &str = "/android-chrome-192x192.png";

/// Paths precached into the static store at install time.
///
/// Changing this list requires bumping the cache version.
pub const PRECACHE_MANIFEST: [&str; 3] = ["/en/~offline", "/sv/~offline", PWA_ICON_PATH];
