//! Cache Module
//!
//! Named response stores, entry snapshots and their timestamps.

mod entry;
mod stats;
mod store;

// Re-export public types
pub use entry::CachedResponse;
pub use stats::CacheStats;
pub use store::{CacheStorage, MemoryStorage};

// == Public Constants ==
/// Response header carrying the Unix-millisecond time a runtime entry was written
pub const TIMESTAMP_HEADER: &str = "x-cache-timestamp";

/// Runtime-store key of the pseudo-entry holding the last full sweep time
pub const SWEEP_SENTINEL_KEY: &str = "/__offline-cache/last-sweep";
