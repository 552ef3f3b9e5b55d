//! Market data cache
//!
//! A get/set-with-TTL key-value seam the market provider writes through.
//! Caching is a performance optimization only: a miss, an expired entry, or a
//! broken backend all fall through to direct computation, so implementations
//! must never panic or block unboundedly.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Key-value cache with per-entry TTL. Implementations must be safe for
/// concurrent reads and writes; a stampede of identical computations is
/// acceptable, corruption is not.
pub trait MarketCache: Send + Sync {
    /// Returns the cached value if present and not expired.
    fn get(&self, key: &str) -> Option<String>;
    /// Stores a value with a TTL. Errors are swallowed by implementations.
    fn set(&self, key: &str, value: String, ttl: Duration);
}

/// In-process cache: a TTL-stamped map behind a read/write lock.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MarketCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        // A poisoned lock is treated as a miss, never an error
        let entries = self.entries.read().ok()?;
        let (value, expires_at) = entries.get(key)?;
        if Instant::now() < *expires_at {
            Some(value.clone())
        } else {
            None
        }
    }

    fn set(&self, key: &str, value: String, ttl: Duration) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.to_string(), (value, Instant::now() + ttl));
        }
    }
}

/// Cache that stores nothing. Swapping it in changes performance, not output.
pub struct NoopCache;

impl MarketCache for NoopCache {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: String, _ttl: Duration) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_cache_round_trip() {
        let cache = MemoryCache::new();
        cache.set("band:catering:mumbai", "v1".to_string(), Duration::from_secs(60));
        assert_eq!(cache.get("band:catering:mumbai"), Some("v1".to_string()));
        assert_eq!(cache.get("band:venue:mumbai"), None);
    }

    #[test]
    fn test_memory_cache_expiry() {
        let cache = MemoryCache::new();
        cache.set("k", "v".to_string(), Duration::from_millis(0));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_overwrite_refreshes_value() {
        let cache = MemoryCache::new();
        cache.set("k", "old".to_string(), Duration::from_secs(60));
        cache.set("k", "new".to_string(), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some("new".to_string()));
    }

    #[test]
    fn test_noop_cache_never_hits() {
        let cache = NoopCache;
        cache.set("k", "v".to_string(), Duration::from_secs(60));
        assert_eq!(cache.get("k"), None);
    }
}
