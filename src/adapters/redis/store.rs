//! Redis-backed [`KeyValueStore`] using `deadpool-redis` connection pooling.
//!
//! # Key Design
//!
//! Every key is prefixed with `<namespace>:` so the cache can share a Redis
//! database with other tenants. Counters use `INCRBY` so concurrent deltas
//! never race; cache entries use `PSETEX` so Redis reclaims them at the end
//! of their tier.

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, PoolConfig, Runtime};
use redis::AsyncCommands;
use std::future::Future;
use std::time::Duration;

use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::models::StoreConfig;
use crate::domain::ports::KeyValueStore;

/// Redis implementation of [`KeyValueStore`].
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
    namespace: String,
    operation_timeout: Duration,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("namespace", &self.namespace)
            .field("operation_timeout", &self.operation_timeout)
            .finish_non_exhaustive()
    }
}

impl RedisStore {
    pub fn new(pool: Pool, namespace: impl Into<String>, operation_timeout: Duration) -> Self {
        Self {
            pool,
            namespace: namespace.into(),
            operation_timeout,
        }
    }

    /// Build the pool from configuration. No connection is opened until the
    /// first operation, so an unreachable server does not prevent startup.
    pub fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| StoreError::Unavailable("no redis url configured".to_string()))?;

        let mut redis_config = Config::from_url(url);
        redis_config.pool = Some(PoolConfig::new(config.pool_size));
        let pool = redis_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|error| StoreError::Unavailable(error.to_string()))?;

        Ok(Self::new(pool, config.namespace.clone(), config.operation_timeout()))
    }

    fn namespaced(&self, key: &str) -> String {
        namespaced_key(&self.namespace, key)
    }

    async fn bounded<T>(&self, operation: impl Future<Output = StoreResult<T>>) -> StoreResult<T> {
        tokio::time::timeout(self.operation_timeout, operation)
            .await
            .map_err(|_| {
                StoreError::Unavailable(format!("operation timed out after {:?}", self.operation_timeout))
            })?
    }
}

fn namespaced_key(namespace: &str, key: &str) -> String {
    if namespace.is_empty() {
        key.to_string()
    } else {
        format!("{namespace}:{key}")
    }
}

/// `PSETEX` rejects zero, so sub-millisecond TTLs round up.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let key = self.namespaced(key);
        self.bounded(async {
            let mut connection = self.pool.get().await?;
            let value: Option<String> = connection.get(&key).await?;
            Ok::<_, StoreError>(value)
        })
        .await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        let key = self.namespaced(key);
        self.bounded(async {
            let mut connection = self.pool.get().await?;
            match ttl {
                Some(ttl) => connection.pset_ex::<_, _, ()>(&key, value, ttl_millis(ttl)).await?,
                None => connection.set::<_, _, ()>(&key, value).await?,
            }
            Ok::<_, StoreError>(())
        })
        .await
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let key = self.namespaced(key);
        self.bounded(async {
            let mut connection = self.pool.get().await?;
            let removed: u64 = connection.del(&key).await?;
            Ok::<_, StoreError>(removed > 0)
        })
        .await
    }

    async fn increment_by(&self, key: &str, delta: i64) -> StoreResult<i64> {
        let namespaced = self.namespaced(key);
        self.bounded(async {
            let mut connection = self.pool.get().await?;
            connection.incr::<_, _, i64>(&namespaced, delta).await.map_err(|error| {
                if error.kind() == redis::ErrorKind::ResponseError {
                    StoreError::InvalidValue {
                        key: key.to_string(),
                        reason: error.to_string(),
                    }
                } else {
                    StoreError::from(error)
                }
            })
        })
        .await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.bounded(async {
            let mut connection = self.pool.get().await?;
            let _: String = redis::cmd("PING").query_async(&mut *connection).await?;
            Ok::<_, StoreError>(())
        })
        .await
    }
}
