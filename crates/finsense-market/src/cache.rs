//! Caching layer for market data to reduce API calls

use cached::{Cached, TimedCache};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Cache key for market data requests
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// Stock symbol, uppercased
    pub symbol: String,
    /// Operation the value came from
    pub endpoint: String,
    /// Additional parameters as JSON string
    pub params: String,
}

impl CacheKey {
    /// Create a new cache key
    pub fn new(symbol: impl Into<String>, endpoint: impl Into<String>, params: impl Serialize) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            endpoint: endpoint.into(),
            params: serde_json::to_string(&params).unwrap_or_default(),
        }
    }

    /// Key without extra parameters
    pub fn plain(symbol: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(symbol, endpoint, ())
    }
}

/// Thread-safe TTL cache shared between clones
pub struct StockCache<V> {
    cache: Arc<RwLock<TimedCache<CacheKey, V>>>,
}

impl<V: Clone> StockCache<V> {
    /// Create a new cache with specified TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Get a value from the cache
    pub async fn get(&self, key: &CacheKey) -> Option<V> {
        // TimedCache evicts on read, so even lookups need the write lock
        let mut cache = self.cache.write().await;
        cache.cache_get(key).cloned()
    }

    /// Insert a value into the cache
    pub async fn insert(&self, key: CacheKey, value: V) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key, value);
    }

    /// Get or fetch a value using the provided fetcher function
    ///
    /// A cached value is returned immediately. Otherwise the fetcher runs and
    /// a successful result is cached; errors are passed through uncached.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: CacheKey, fetcher: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key).await {
            tracing::debug!(?key, "cache hit");
            return Ok(value);
        }

        tracing::debug!(?key, "cache miss");

        let value = fetcher().await?;
        self.insert(key, value.clone()).await;

        Ok(value)
    }

    /// Clear all cached entries
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.cache_clear();
    }

    /// Get the number of cached entries
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }
}

impl<V> Clone for StockCache<V> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}
