use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::AppResult;

/// Cached dashboard entry with the time it was loaded
#[derive(Debug, Clone)]
pub struct CachedEntry<T> {
    pub value: T,
    pub loaded_at: DateTime<Utc>,
}

impl<T> CachedEntry<T> {
    fn is_fresh(&self, ttl_ms: i64) -> bool {
        let age = Utc::now() - self.loaded_at;
        age.num_milliseconds() < ttl_ms
    }
}

/// Per-key dashboard data cache with TTL.
///
/// Owned by the app context; cloning shares the same entries.
#[derive(Clone)]
pub struct DashboardCache<T> {
    entries: Arc<RwLock<HashMap<String, CachedEntry<T>>>>,
    ttl_ms: i64,
}

impl<T: Clone + Send + Sync> DashboardCache<T> {
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl_ms: i64::try_from(ttl_ms).unwrap_or(i64::MAX),
        }
    }

    /// Get cached value if it exists and is fresh
    pub async fn get(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().await;

        match entries.get(key) {
            Some(entry) if entry.is_fresh(self.ttl_ms) => {
                debug!("✓ Dashboard cache hit: {}", key);
                Some(entry.value.clone())
            }
            Some(_) => {
                debug!("⚠ Dashboard cache stale: {}", key);
                None
            }
            None => None,
        }
    }

    pub async fn set(&self, key: &str, value: T) {
        let entry = CachedEntry {
            value,
            loaded_at: Utc::now(),
        };
        self.entries.write().await.insert(key.to_string(), entry);
        debug!("💾 Cached dashboard data: {}", key);
    }

    /// Serve from cache, loading on miss or expiry
    pub async fn get_or_load<F, Fut>(&self, key: &str, loader: F) -> AppResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }
        self.refresh(key, loader).await
    }

    /// Reload `key` regardless of freshness. A failed load keeps the old entry.
    pub async fn refresh<F, Fut>(&self, key: &str, loader: F) -> AppResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let value = loader().await?;
        self.set(key, value.clone()).await;
        Ok(value)
    }

    /// Drop one entry, e.g. after the record behind it changed
    pub async fn reset_for_key(&self, key: &str) {
        if self.entries.write().await.remove(key).is_some() {
            debug!("🗑 Dashboard cache entry reset: {}", key);
        }
    }

    /// Clear everything (logout)
    pub async fn clear(&self) {
        self.entries.write().await.clear();
        info!("🔄 Dashboard cache cleared");
    }

    pub async fn size(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_get_or_load_caches() {
        let cache = DashboardCache::new(5000);
        let loads = AtomicU32::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_load("users", || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .await
                .unwrap();
            assert_eq!(value, 42);
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.size().await, 1);
    }

    #[tokio::test]
    async fn test_reset_for_key_forces_reload() {
        let cache = DashboardCache::new(5000);
        cache.set("users", 1).await;
        cache.set("transactions", 2).await;

        cache.reset_for_key("users").await;
        assert!(cache.get("users").await.is_none());
        assert_eq!(cache.get("transactions").await, Some(2));

        let value = cache.get_or_load("users", || async { Ok(10) }).await.unwrap();
        assert_eq!(value, 10);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_previous_value() {
        let cache: DashboardCache<u32> = DashboardCache::new(5000);
        cache.set("stats", 7).await;

        let result = cache
            .refresh("stats", || async { Err(AppError::ExternalError("offline".to_string())) })
            .await;
        assert!(result.is_err());
        assert_eq!(cache.get("stats").await, Some(7));

        let refreshed = cache.refresh("stats", || async { Ok(8) }).await.unwrap();
        assert_eq!(refreshed, 8);
    }

    #[tokio::test]
    async fn test_entry_expiry() {
        let cache = DashboardCache::new(100); // 100ms TTL
        cache.set("stats", "fresh".to_string()).await;
        assert!(cache.get("stats").await.is_some());

        tokio::time::sleep(tokio::time::Duration::from_millis(150)).await;
        assert!(cache.get("stats").await.is_none());
    }

    #[tokio::test]
    async fn test_clear_on_logout() {
        let cache = DashboardCache::new(5000);
        cache.set("a", 1).await;
        cache.set("b", 2).await;

        cache.clear().await;
        assert_eq!(cache.size().await, 0);
    }
}
