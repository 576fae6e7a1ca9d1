//! Runtime Store Eviction
//!
//! Three clocks decide when runtime entries die:
//! - the in-memory gate limits checks to one per 24 hours,
//! - the persisted sentinel limits real sweeps to one per 30 days,
//! - each entry's timestamp header decides whether it is old enough to delete.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{CacheStorage, CachedResponse, SWEEP_SENTINEL_KEY};

/// Minimum hours between two eviction checks.
pub const CHECK_INTERVAL_HOURS: i64 = 24;

/// Days after which an entry expires, and between two sweeps.
pub const MAX_AGE_DAYS: i64 = 30;

// == Eviction Outcome ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EvictionOutcome {
    /// Checked less than 24 hours ago
    Gated,
    /// No sentinel in the runtime store yet
    NoSentinel,
    /// Last sweep was less than 30 days ago
    TooRecent { days_elapsed: i64 },
    /// Sweep ran and the sentinel was advanced
    Swept { removed: usize },
    /// The sentinel could not be read
    StorageUnavailable,
}

// == Eviction Gate ==
/// In-memory "last checked" time. Resets only when the process restarts.
#[derive(Debug, Default)]
pub struct EvictionGate {
    last_check: Mutex<Option<DateTime<Utc>>>,
}

impl EvictionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true and records `now` if the previous check is at least
    /// 24 hours old (or there was none).
    pub async fn try_enter(&self, now: DateTime<Utc>) -> bool {
        let mut last_check = self.last_check.lock().await;
        match *last_check {
            Some(last) if now - last < Duration::hours(CHECK_INTERVAL_HOURS) => false,
            _ => {
                *last_check = Some(now);
                true
            }
        }
    }

    pub async fn last_check(&self) -> Option<DateTime<Utc>> {
        *self.last_check.lock().await
    }
}

/// Runs a sweep of `cache` if the sentinel is at least 30 days old.
///
/// The gate is not consulted here.
pub async fn sweep(storage: &dyn CacheStorage, cache: &str, now: DateTime<Utc>) -> EvictionOutcome {
    let sentinel = match storage.get(cache, SWEEP_SENTINEL_KEY).await {
        Ok(Some(entry)) => entry,
        Ok(None) => {
            debug!(cache, "No sweep sentinel, nothing to evict");
            return EvictionOutcome::NoSentinel;
        }
        Err(e) => {
            warn!(cache, error = %e, "Failed to read sweep sentinel");
            return EvictionOutcome::StorageUnavailable;
        }
    };

    let Some(last_sweep) = sentinel.sentinel_time() else {
        warn!(cache, "Sweep sentinel is malformed, ignoring");
        return EvictionOutcome::NoSentinel;
    };

    let days_elapsed = (now - last_sweep).num_days();
    if days_elapsed < MAX_AGE_DAYS {
        debug!(cache, days_elapsed, "Last sweep too recent");
        return EvictionOutcome::TooRecent { days_elapsed };
    }

    let removed = remove_expired(storage, cache, now).await;

    if let Err(e) = storage
        .put(cache, SWEEP_SENTINEL_KEY, CachedResponse::sentinel(now))
        .await
    {
        warn!(cache, error = %e, "Failed to advance sweep sentinel");
    }

    info!(cache, removed, "Runtime cache sweep complete");
    EvictionOutcome::Swept { removed }
}

/// Deletes stamped entries older than 30 days. Stops at the first storage
/// error and returns what was removed so far.
async fn remove_expired(storage: &dyn CacheStorage, cache: &str, now: DateTime<Utc>) -> usize {
    let keys = match storage.keys(cache).await {
        Ok(keys) => keys,
        Err(e) => {
            warn!(cache, error = %e, "Failed to enumerate runtime cache");
            return 0;
        }
    };

    let max_age = Duration::days(MAX_AGE_DAYS);
    let mut removed = 0;

    for key in keys.iter().filter(|k| k.as_str() != SWEEP_SENTINEL_KEY) {
        let entry = match storage.get(cache, key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => continue,
            Err(e) => {
                warn!(cache, key = %key, error = %e, "Sweep aborted mid-enumeration");
                break;
            }
        };

        // Unstamped entries are never expired
        let Some(age) = entry.age(now) else {
            continue;
        };

        if age > max_age {
            match storage.delete(cache, key).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(cache, key = %key, error = %e, "Sweep aborted mid-enumeration");
                    break;
                }
            }
        }
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStorage;
    use crate::models::FetchResponse;

    const RUNTIME: &str = "runtime-v1";

    fn stamped(at: DateTime<Utc>) -> CachedResponse {
        CachedResponse::from_response(&FetchResponse::ok("page")).stamped(at)
    }

    #[tokio::test]
    async fn test_gate_allows_once_per_day() {
        let gate = EvictionGate::new();
        let now = Utc::now();

        assert!(gate.try_enter(now).await);
        assert!(!gate.try_enter(now + Duration::hours(23)).await);
        assert!(gate.try_enter(now + Duration::hours(24)).await);
        assert_eq!(gate.last_check().await, Some(now + Duration::hours(24)));
    }

    #[tokio::test]
    async fn test_sweep_without_sentinel() {
        let storage = MemoryStorage::new();
        storage.put(RUNTIME, "old", stamped(Utc::now() - Duration::days(90))).await.unwrap();

        let outcome = sweep(&storage, RUNTIME, Utc::now()).await;

        assert_eq!(outcome, EvictionOutcome::NoSentinel);
        assert_eq!(storage.len(RUNTIME).await, 1);
    }

    #[tokio::test]
    async fn test_sweep_too_recent() {
        let storage = MemoryStorage::new();
        let now = Utc::now();
        storage
            .put(RUNTIME, SWEEP_SENTINEL_KEY, CachedResponse::sentinel(now - Duration::days(12)))
            .await
            .unwrap();
        storage.put(RUNTIME, "old", stamped(now - Duration::days(90))).await.unwrap();

        let outcome = sweep(&storage, RUNTIME, now).await;

        assert_eq!(outcome, EvictionOutcome::TooRecent { days_elapsed: 12 });
        assert!(storage.get(RUNTIME, "old").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sweep_deletes_only_expired_entries() {
        let storage = MemoryStorage::new();
        let now = Utc::now();
        storage
            .put(RUNTIME, SWEEP_SENTINEL_KEY, CachedResponse::sentinel(now - Duration::days(31)))
            .await
            .unwrap();
        storage.put(RUNTIME, "ten", stamped(now - Duration::days(10))).await.unwrap();
        storage.put(RUNTIME, "twenty-nine", stamped(now - Duration::days(29))).await.unwrap();
        storage.put(RUNTIME, "thirty-one", stamped(now - Duration::days(31))).await.unwrap();

        let outcome = sweep(&storage, RUNTIME, now).await;

        assert_eq!(outcome, EvictionOutcome::Swept { removed: 1 });
        assert!(storage.get(RUNTIME, "ten").await.unwrap().is_some());
        assert!(storage.get(RUNTIME, "twenty-nine").await.unwrap().is_some());
        assert!(storage.get(RUNTIME, "thirty-one").await.unwrap().is_none());

        let sentinel = storage.get(RUNTIME, SWEEP_SENTINEL_KEY).await.unwrap().unwrap();
        assert_eq!(sentinel.sentinel_time(), Some(now));
    }

    #[tokio::test]
    async fn test_sweep_keeps_unstamped_entries() {
        let storage = MemoryStorage::new();
        let now = Utc::now();
        storage
            .put(RUNTIME, SWEEP_SENTINEL_KEY, CachedResponse::sentinel(now - Duration::days(45)))
            .await
            .unwrap();
        storage
            .put(RUNTIME, "unstamped", CachedResponse::from_response(&FetchResponse::ok("x")))
            .await
            .unwrap();

        let outcome = sweep(&storage, RUNTIME, now).await;

        assert_eq!(outcome, EvictionOutcome::Swept { removed: 0 });
        assert!(storage.get(RUNTIME, "unstamped").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sweep_advances_sentinel_when_nothing_removed() {
        let storage = MemoryStorage::new();
        let now = Utc::now();
        storage
            .put(RUNTIME, SWEEP_SENTINEL_KEY, CachedResponse::sentinel(now - Duration::days(30)))
            .await
            .unwrap();

        assert_eq!(
            sweep(&storage, RUNTIME, now).await,
            EvictionOutcome::Swept { removed: 0 }
        );
        assert_eq!(
            sweep(&storage, RUNTIME, now + Duration::days(1)).await,
            EvictionOutcome::TooRecent { days_elapsed: 1 }
        );
    }

    #[test]
    fn test_outcome_serialize() {
        let json = serde_json::to_string(&EvictionOutcome::Swept { removed: 2 }).unwrap();
        assert_eq!(json, r#"{"outcome":"swept","removed":2}"#);
    }
}
