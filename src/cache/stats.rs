//! Cache Statistics Module
//!
//! Tracks how requests were answered: from cache, from a fallback, or not at all.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache manager metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Requests answered from a cache store
    pub hits: u64,
    /// Cache lookups that found nothing
    pub misses: u64,
    /// Network failures answered from the runtime store
    pub network_fallbacks: u64,
    /// Network failures answered with an offline page
    pub offline_pages: u64,
    /// Runtime entries deleted by sweeps
    pub evictions: u64,
    /// Current number of runtime entries
    pub runtime_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_network_fallback(&mut self) {
        self.hits += 1;
        self.network_fallbacks += 1;
    }

    pub fn record_offline_page(&mut self) {
        self.offline_pages += 1;
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    pub fn set_runtime_entries(&mut self, count: usize) {
        self.runtime_entries = count;
    }
}
