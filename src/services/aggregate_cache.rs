//! Read-through cache for expensive aggregates.
//!
//! Entries are wrapped in a [`CacheEntry`] envelope carrying their own
//! expiry, so a store that ignores TTLs still never serves stale data past
//! its tier. Every store failure is absorbed here: reads fall through to the
//! compute function and writes are skipped.

use chrono::Utc;
use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult, StoreResult};
use crate::domain::models::{CacheEntry, CacheKey, CacheTier, Section, TierTable};
use crate::domain::ports::KeyValueStore;

/// How a value was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from a live entry.
    Hit,
    /// Computed and written back.
    Miss,
    /// Computed without touching the store.
    Bypass,
    /// The store failed; computed and not written back.
    Degraded,
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hit => write!(f, "HIT"),
            Self::Miss => write!(f, "MISS"),
            Self::Bypass => write!(f, "BYPASS"),
            Self::Degraded => write!(f, "DEGRADED"),
        }
    }
}

/// A value together with how it was obtained.
#[derive(Debug, Clone)]
pub struct CacheLookup<T> {
    pub value: T,
    pub status: CacheStatus,
}

impl<T> CacheLookup<T> {
    pub const fn new(value: T, status: CacheStatus) -> Self {
        Self { value, status }
    }
}

pub struct AggregateCache {
    store: Arc<dyn KeyValueStore>,
    tiers: TierTable,
}

impl AggregateCache {
    pub fn new(store: Arc<dyn KeyValueStore>, tiers: TierTable) -> Self {
        Self { store, tiers }
    }

    pub fn tiers(&self) -> TierTable {
        self.tiers
    }

    /// Return the live value under `key`, or compute, store, and return it.
    ///
    /// Compute errors reach the caller as [`DomainError::ComputeFailure`].
    pub async fn fetch<T, F, Fut>(&self, key: &str, tier: CacheTier, compute: F) -> DomainResult<CacheLookup<T>>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = DomainResult<T>> + Send,
    {
        let readable = match self.store.get(key).await {
            Ok(Some(raw)) => {
                if let Some(payload) = self.decode_live::<T>(key, &raw) {
                    tracing::debug!(key, tier = %tier, "cache hit");
                    return Ok(CacheLookup::new(payload, CacheStatus::Hit));
                }
                true
            }
            Ok(None) => true,
            Err(error) => {
                tracing::warn!(key, error = %error, "cache read failed, computing directly");
                false
            }
        };

        let value = run_compute(compute).await?;

        if !readable {
            return Ok(CacheLookup::new(value, CacheStatus::Degraded));
        }

        let ttl = self.tiers.ttl(tier);
        let entry = CacheEntry {
            key: key.to_string(),
            payload: value,
            expires_at: Utc::now() + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::zero()),
        };

        match serde_json::to_string(&entry) {
            Ok(encoded) => {
                if let Err(error) = self.store.set(key, &encoded, Some(ttl)).await {
                    tracing::warn!(key, error = %error, "cache write failed");
                    return Ok(CacheLookup::new(entry.payload, CacheStatus::Degraded));
                }
                tracing::debug!(key, tier = %tier, ttl_secs = ttl.as_secs(), "cache fill");
            }
            Err(error) => {
                tracing::warn!(key, error = %error, "cache entry not serializable, skipping write");
            }
        }

        Ok(CacheLookup::new(entry.payload, CacheStatus::Miss))
    }

    /// Compute without reading or writing the store.
    pub async fn bypass<T, F, Fut>(&self, compute: F) -> DomainResult<CacheLookup<T>>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = DomainResult<T>> + Send,
    {
        run_compute(compute).await.map(|value| CacheLookup::new(value, CacheStatus::Bypass))
    }

    /// Delete every section stored under `key`. Returns how many existed.
    ///
    /// All deletes are attempted; the first failure is reported.
    pub async fn evict(&self, key: &CacheKey) -> StoreResult<usize> {
        let section_keys: Vec<String> = Section::ALL.iter().map(|s| key.section(*s)).collect();
        let results = join_all(section_keys.iter().map(|k| self.store.delete(k))).await;

        let mut removed = 0;
        let mut first_error = None;
        for result in results {
            match result {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(error) => {
                    first_error.get_or_insert(error);
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(removed),
        }
    }

    fn decode_live<T: DeserializeOwned>(&self, key: &str, raw: &str) -> Option<T> {
        match serde_json::from_str::<CacheEntry<T>>(raw) {
            Ok(entry) if entry.key == key && entry.is_live(Utc::now()) => Some(entry.payload),
            Ok(_) => None,
            Err(error) => {
                tracing::warn!(key, error = %error, "undecodable cache entry, treating as miss");
                None
            }
        }
    }
}

async fn run_compute<T, F, Fut>(compute: F) -> DomainResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DomainResult<T>>,
{
    compute().await.map_err(|error| match error {
        DomainError::ComputeFailure(_) => error,
        other => DomainError::ComputeFailure(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn cache_with(store: Arc<InMemoryStore>) -> AggregateCache {
        AggregateCache::new(store, TierTable::default())
    }

    #[tokio::test]
    async fn test_second_fetch_within_tier_is_a_hit() {
        let store = Arc::new(InMemoryStore::new());
        let cache = cache_with(store.clone());
        let calls = AtomicUsize::new(0);
        let counted = &calls;

        for _ in 0..3 {
            let lookup = cache
                .fetch("aggregate/admin/all/aggregates", CacheTier::Aggregate, move || async move {
                    counted.fetch_add(1, Ordering::SeqCst);
                    Ok(41_u64 + 1)
                })
                .await
                .unwrap();
            assert_eq!(lookup.value, 42);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(store.contains_key("aggregate/admin/all/aggregates"));
    }

    #[tokio::test]
    async fn test_store_down_computes_every_time_without_error() {
        let store = Arc::new(InMemoryStore::new());
        store.set_available(false);
        let cache = cache_with(store.clone());
        let calls = AtomicUsize::new(0);
        let counted = &calls;

        for _ in 0..2 {
            let lookup = cache
                .fetch("k", CacheTier::Activity, move || async move {
                    counted.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1, 2, 3])
                })
                .await
                .unwrap();
            assert_eq!(lookup.status, CacheStatus::Degraded);
            assert_eq!(lookup.value, vec![1, 2, 3]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        store.set_available(true);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_compute_failure_is_propagated() {
        let cache = cache_with(Arc::new(InMemoryStore::new()));
        let result = cache
            .fetch::<u64, _, _>("k", CacheTier::Aggregate, || async {
                Err(DomainError::DatabaseError("disk I/O error".to_string()))
            })
            .await;

        assert!(matches!(result, Err(DomainError::ComputeFailure(msg)) if msg.contains("disk I/O error")));
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_recomputed_and_replaced() {
        let store = Arc::new(InMemoryStore::new());
        store.set("k", "not json", None).await.unwrap();
        let cache = cache_with(store.clone());

        let lookup = cache.fetch("k", CacheTier::Aggregate, || async { Ok(7_u64) }).await.unwrap();
        assert_eq!(lookup.status, CacheStatus::Miss);

        let again = cache
            .fetch("k", CacheTier::Aggregate, || async { Ok(0_u64) })
            .await
            .unwrap();
        assert_eq!(again.status, CacheStatus::Hit);
        assert_eq!(again.value, 7);
    }

    #[tokio::test]
    async fn test_expired_envelope_is_a_miss_even_if_store_kept_it() {
        let store = Arc::new(InMemoryStore::new());
        let stale = CacheEntry {
            key: "k".to_string(),
            payload: 1_u64,
            expires_at: Utc::now() - chrono::Duration::seconds(1),
        };
        store.set("k", &serde_json::to_string(&stale).unwrap(), None).await.unwrap();

        let cache = cache_with(store);
        let lookup = cache.fetch("k", CacheTier::Aggregate, || async { Ok(2_u64) }).await.unwrap();
        assert_eq!(lookup.status, CacheStatus::Miss);
        assert_eq!(lookup.value, 2);
    }

    #[tokio::test]
    async fn test_entry_expires_after_tier_ttl() {
        let store = Arc::new(InMemoryStore::new());
        let tiers = TierTable {
            aggregate: Duration::from_millis(30),
            activity: Duration::from_millis(30),
        };
        let cache = AggregateCache::new(store, tiers);

        cache.fetch("k", CacheTier::Aggregate, || async { Ok(1_u64) }).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        let lookup = cache.fetch("k", CacheTier::Aggregate, || async { Ok(2_u64) }).await.unwrap();

        assert_eq!(lookup.status, CacheStatus::Miss);
        assert_eq!(lookup.value, 2);
    }

    #[tokio::test]
    async fn test_evict_removes_all_sections() {
        let store = Arc::new(InMemoryStore::new());
        let cache = cache_with(store.clone());
        let key = CacheKey::new("aggregate/member/g0/7");

        for section in Section::ALL {
            cache
                .fetch(&key.section(section), section.tier(), || async { Ok(1_u8) })
                .await
                .unwrap();
        }
        assert_eq!(store.len(), 3);

        assert_eq!(cache.evict(&key).await.unwrap(), 3);
        assert!(store.is_empty());
        assert_eq!(cache.evict(&key).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_evict_reports_store_failure() {
        let store = Arc::new(InMemoryStore::new());
        store.set_available(false);
        let cache = cache_with(store);

        assert!(cache.evict(&CacheKey::new("aggregate/admin/all")).await.is_err());
    }
}
