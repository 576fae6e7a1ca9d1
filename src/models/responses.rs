//! Response DTOs for the control endpoints
//!
//! Defines the structure of outgoing JSON bodies.

use serde::Serialize;

/// Response body for the stats endpoint (GET /__offline/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
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
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from cache statistics
    pub fn new(stats: &crate::cache::CacheStats) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            network_fallbacks: stats.network_fallbacks,
            offline_pages: stats.offline_pages,
            evictions: stats.evictions,
            runtime_entries: stats.runtime_entries,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /__offline/health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Lifecycle state of the cache manager
    pub state: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy(state: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            state: state.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Acknowledgement of a client message.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub accepted: bool,
    pub detail: String,
}

impl MessageResponse {
    pub fn new(accepted: bool, detail: impl Into<String>) -> Self {
        Self {
            accepted,
            detail: detail.into(),
        }
    }
}

/// Notification produced from a push payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub url: String,
}

/// Target of a notification click.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationClickResponse {
    pub open_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStats;

    #[test]
    fn test_stats_response_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..CacheStats::default()
        };
        let resp = StatsResponse::new(&stats);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy("active");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("active"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_notification_serialize() {
        let n = Notification {
            title: "Hi".to_string(),
            body: "There".to_string(),
            url: "/".to_string(),
        };
        let json = serde_json::to_string(&n).unwrap();
        assert!(json.contains("\"url\":\"/\""));
    }
}
