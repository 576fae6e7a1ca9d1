//! Cache Store Module
//!
//! Named, disjoint key-value stores of response snapshots.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::CachedResponse;
use crate::error::Result;

// == Cache Storage ==
/// A set of named cache stores.
///
/// Writes to a single key are atomic; concurrent writes to the same key are
/// last-write-wins. Writing to a store that does not exist creates it.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    async fn get(&self, cache: &str, key: &str) -> Result<Option<CachedResponse>>;

    async fn put(&self, cache: &str, key: &str, entry: CachedResponse) -> Result<()>;

    /// Returns whether an entry was removed.
    async fn delete(&self, cache: &str, key: &str) -> Result<bool>;

    /// Keys of every entry in `cache`; empty if the store does not exist.
    async fn keys(&self, cache: &str) -> Result<Vec<String>>;

    async fn cache_names(&self) -> Result<Vec<String>>;

    /// Drops a whole store. Returns whether it existed.
    async fn delete_cache(&self, cache: &str) -> Result<bool>;
}

// == Memory Storage ==
/// In-process storage backend.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    caches: RwLock<HashMap<String, HashMap<String, CachedResponse>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in `cache`.
    pub async fn len(&self, cache: &str) -> usize {
        self.caches
            .read()
            .await
            .get(cache)
            .map(HashMap::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn get(&self, cache: &str, key: &str) -> Result<Option<CachedResponse>> {
        let caches = self.caches.read().await;
        Ok(caches.get(cache).and_then(|entries| entries.get(key)).cloned())
    }

    async fn put(&self, cache: &str, key: &str, entry: CachedResponse) -> Result<()> {
        let mut caches = self.caches.write().await;
        caches
            .entry(cache.to_string())
            .or_default()
            .insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, cache: &str, key: &str) -> Result<bool> {
        let mut caches = self.caches.write().await;
        Ok(caches
            .get_mut(cache)
            .map(|entries| entries.remove(key).is_some())
            .unwrap_or(false))
    }

    async fn keys(&self, cache: &str) -> Result<Vec<String>> {
        let caches = self.caches.read().await;
        Ok(caches
            .get(cache)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn cache_names(&self) -> Result<Vec<String>> {
        Ok(self.caches.read().await.keys().cloned().collect())
    }

    async fn delete_cache(&self, cache: &str) -> Result<bool> {
        Ok(self.caches.write().await.remove(cache).is_some())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FetchResponse;

    fn entry(body: &'static str) -> CachedResponse {
        CachedResponse::from_response(&FetchResponse::ok(body))
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let storage = MemoryStorage::new();

        storage.put("runtime-v1", "/en/events", entry("a")).await.unwrap();
        let found = storage.get("runtime-v1", "/en/events").await.unwrap();

        assert_eq!(found.unwrap().body, "a");
        assert_eq!(storage.len("runtime-v1").await, 1);
    }

    #[tokio::test]
    async fn test_stores_are_disjoint() {
        let storage = MemoryStorage::new();

        storage.put("static-v1", "/font.woff2", entry("font")).await.unwrap();

        assert!(storage.get("runtime-v1", "/font.woff2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite_keeps_single_entry() {
        let storage = MemoryStorage::new();

        storage.put("runtime-v1", "k", entry("first")).await.unwrap();
        storage.put("runtime-v1", "k", entry("second")).await.unwrap();

        assert_eq!(storage.len("runtime-v1").await, 1);
        assert_eq!(
            storage.get("runtime-v1", "k").await.unwrap().unwrap().body,
            "second"
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let storage = MemoryStorage::new();
        storage.put("runtime-v1", "k", entry("v")).await.unwrap();

        assert!(storage.delete("runtime-v1", "k").await.unwrap());
        assert!(!storage.delete("runtime-v1", "k").await.unwrap());
        assert!(!storage.delete("missing", "k").await.unwrap());
    }

    #[tokio::test]
    async fn test_keys_of_missing_store_is_empty() {
        let storage = MemoryStorage::new();
        assert!(storage.keys("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_cache() {
        let storage = MemoryStorage::new();
        storage.put("static-v0", "k", entry("v")).await.unwrap();
        storage.put("static-v1", "k", entry("v")).await.unwrap();

        assert!(storage.delete_cache("static-v0").await.unwrap());
        assert_eq!(storage.cache_names().await.unwrap(), vec!["static-v1"]);
    }
}
