//! Mock caches.
//!
//! `MemoryCacheMock` is the typed in-process cache controllers read through;
//! `MockDistributedCache` implements the byte-oriented [`DistributedCache`]
//! trait for code written against an external cache seam.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value as JsonValue;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache serialization error: {message}")]
    Serialization { message: String },

    #[error("Cache backend error: {message}")]
    Backend { message: String },
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: JsonValue,
    expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    fn expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-memory cache with TTL semantics. Expired entries behave as absent.
#[derive(Debug, Default)]
pub struct MemoryCacheMock {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCacheMock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: impl Into<String>, value: JsonValue, ttl: Option<Duration>) {
        let entry = CacheEntry {
            value,
            expires_at: ttl.map(|ttl| Utc::now() + ttl),
        };
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.into(), entry);
    }

    pub fn put_forever(&self, key: impl Into<String>, value: JsonValue) {
        self.put(key, value, None);
    }

    pub fn get(&self, key: &str) -> Option<JsonValue> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries
            .get(key)
            .filter(|entry| !entry.expired(Utc::now()))
            .map(|entry| entry.value.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn forget(&self, key: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key)
            .is_some()
    }

    pub fn flush(&self) {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    pub fn len(&self) -> usize {
        let now = Utc::now();
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .filter(|entry| !entry.expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Byte-oriented cache seam, for code written against an external store.
#[async_trait]
pub trait DistributedCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;
    async fn put(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>)
        -> Result<(), CacheError>;
    async fn forget(&self, key: &str) -> Result<bool, CacheError>;
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;
    async fn flush(&self) -> Result<(), CacheError>;
}

#[derive(Debug, Clone)]
struct ByteEntry {
    value: Vec<u8>,
    expires_at: Option<DateTime<Utc>>,
}

/// In-memory implementation of [`DistributedCache`].
#[derive(Debug, Default)]
pub struct MockDistributedCache {
    entries: RwLock<HashMap<String, ByteEntry>>,
}

impl MockDistributedCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn live_value(&self, key: &str) -> Option<Vec<u8>> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries
            .get(key)
            .filter(|entry| entry.expires_at.map_or(true, |at| at > Utc::now()))
            .map(|entry| entry.value.clone())
    }
}

#[async_trait]
impl DistributedCache for MockDistributedCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.live_value(key))
    }

    async fn put(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let entry = ByteEntry {
            value,
            expires_at: ttl.map(|ttl| Utc::now() + ttl),
        };
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), entry);
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key)
            .is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.live_value(key).is_some())
    }

    async fn flush(&self) -> Result<(), CacheError> {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_cache_round_trip() {
        let cache = MemoryCacheMock::new();
        cache.put_forever("greeting", serde_json::json!("hello"));

        assert_eq!(cache.get("greeting"), Some(serde_json::json!("hello")));
        assert!(cache.contains("greeting"));
        assert!(cache.forget("greeting"));
        assert!(!cache.contains("greeting"));
    }

    #[test]
    fn expired_entries_are_absent() {
        let cache = MemoryCacheMock::new();
        cache.put("stale", serde_json::json!(1), Some(Duration::seconds(-1)));
        cache.put("fresh", serde_json::json!(2), Some(Duration::minutes(5)));

        assert!(cache.get("stale").is_none());
        assert!(cache.get("fresh").is_some());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn distributed_cache_round_trip() {
        let cache = MockDistributedCache::new();
        cache.put("key", b"value".to_vec(), None).await.unwrap();

        assert_eq!(cache.get("key").await.unwrap(), Some(b"value".to_vec()));
        assert!(cache.exists("key").await.unwrap());
        assert!(cache.forget("key").await.unwrap());
        assert!(!cache.exists("key").await.unwrap());
    }

    #[tokio::test]
    async fn distributed_cache_flush_clears_everything() {
        let cache = MockDistributedCache::new();
        cache.put("a", vec![1], None).await.unwrap();
        cache.put("b", vec![2], None).await.unwrap();

        cache.flush().await.unwrap();
        assert!(!cache.exists("a").await.unwrap());
        assert!(!cache.exists("b").await.unwrap());
    }
}
