use async_trait::async_trait;
use std::time::Duration;

use crate::domain::errors::StoreResult;

/// Port for the external key-value service that holds cache entries,
/// counters and cohort version tokens.
///
/// One client is constructed at process start and shared by every component
/// that needs it. Every operation is a single round trip; implementations
/// must not retry internally.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch a value. `Ok(None)` when the key is absent or expired.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store a value, optionally expiring after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()>;

    /// Remove a key. Returns whether it existed.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Atomically add `delta` to an integer value, creating it at zero first
    /// when absent. Returns the new value.
    async fn increment_by(&self, key: &str, delta: i64) -> StoreResult<i64>;

    /// Cheap liveness probe.
    async fn ping(&self) -> StoreResult<()>;
}
