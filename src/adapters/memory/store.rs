//! `dashmap`-backed key-value store with per-key expiry.
//!
//! Integer deltas go through the map's entry lock, so concurrent
//! increments of one key serialize the same way `INCRBY` does on Redis.
//! An availability switch lets tests simulate a store outage.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::ports::KeyValueStore;

#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Process-local implementation of [`KeyValueStore`].
#[derive(Debug)]
pub struct InMemoryStore {
    entries: DashMap<String, StoredValue>,
    available: AtomicBool,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            available: AtomicBool::new(true),
        }
    }

    /// Make every subsequent operation fail with `StoreError::Unavailable`
    /// (or succeed again).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Drop every key, as a restarted store without persistence would.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Whether a live (unexpired) value exists, bypassing the availability switch.
    pub fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries.get(key).is_some_and(|v| !v.is_expired(now))
    }

    /// Number of stored keys, including expired ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn ensure_available(&self) -> StoreResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store disabled".to_string()))
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.ensure_available()?;
        let now = Instant::now();

        let expired = match self.entries.get(key) {
            Some(stored) if !stored.is_expired(now) => return Ok(Some(stored.value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove_if(key, |_, v| v.is_expired(now));
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        self.ensure_available()?;
        self.entries.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        self.ensure_available()?;
        let now = Instant::now();
        Ok(self.entries.remove(key).is_some_and(|(_, v)| !v.is_expired(now)))
    }

    async fn increment_by(&self, key: &str, delta: i64) -> StoreResult<i64> {
        self.ensure_available()?;
        let now = Instant::now();

        let mut entry = self.entries.entry(key.to_string()).or_insert_with(|| StoredValue {
            value: "0".to_string(),
            expires_at: None,
        });
        if entry.is_expired(now) {
            *entry = StoredValue {
                value: "0".to_string(),
                expires_at: None,
            };
        }

        let current: i64 = entry.value.parse().map_err(|_| StoreError::InvalidValue {
            key: key.to_string(),
            reason: format!("not an integer: {}", entry.value),
        })?;
        let next = current.saturating_add(delta);
        entry.value = next.to_string();
        Ok(next)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.ensure_available()
    }
}
