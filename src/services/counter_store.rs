//! Denormalized per-user counters kept in the external store.
//!
//! Writes are best-effort: an unreachable store is logged and the
//! relational mutation that triggered the write still succeeds. Reads fall
//! back to a live relational count, so readers always get a number.

use std::sync::Arc;

use crate::domain::errors::{DomainResult, StoreError, StoreResult};
use crate::domain::models::{counter_key, CounterName, CounterRecord, UserId};
use crate::domain::ports::{KeyValueStore, TaskRepository};

pub struct CounterStore<T: TaskRepository> {
    store: Arc<dyn KeyValueStore>,
    tasks: Arc<T>,
}

impl<T: TaskRepository> CounterStore<T> {
    pub fn new(store: Arc<dyn KeyValueStore>, tasks: Arc<T>) -> Self {
        Self { store, tasks }
    }

    /// Atomically add one. A missing counter starts from zero.
    pub async fn increment(&self, subject: UserId, counter: CounterName) {
        self.apply_delta(subject, counter, 1).await;
    }

    /// Atomically subtract one. The stored value may go negative; reads clamp it.
    pub async fn decrement(&self, subject: UserId, counter: CounterName) {
        self.apply_delta(subject, counter, -1).await;
    }

    async fn apply_delta(&self, subject: UserId, counter: CounterName, delta: i64) {
        let key = counter_key(subject, counter);
        match self.store.increment_by(&key, delta).await {
            Ok(value) => {
                tracing::debug!(key = %key, delta, value, "counter updated");
            }
            Err(error) => {
                tracing::error!(
                    subject_id = %subject,
                    counter = %counter,
                    delta,
                    error = %error,
                    "counter update dropped, reconcile to repair"
                );
            }
        }
    }

    /// Current counter value, never negative.
    ///
    /// A missing key reads as zero. When the store is unreachable or holds
    /// garbage, the value is counted from the relational store instead and
    /// not written back.
    pub async fn read(&self, subject: UserId, counter: CounterName) -> DomainResult<u64> {
        match self.stored_value(subject, counter).await {
            Ok(Some(value)) => Ok(u64::try_from(value).unwrap_or(0)),
            Ok(None) => Ok(0),
            Err(error) => {
                tracing::warn!(
                    subject_id = %subject,
                    counter = %counter,
                    error = %error,
                    "counter unavailable, counting from relational store"
                );
                self.tasks.count_for_counter(subject, counter).await
            }
        }
    }

    pub async fn read_record(&self, subject: UserId, counter: CounterName) -> DomainResult<CounterRecord> {
        Ok(CounterRecord {
            subject_id: subject,
            counter_name: counter,
            value: self.read(subject, counter).await?,
        })
    }

    /// The raw stored value, without clamping or fallback.
    pub async fn stored_value(&self, subject: UserId, counter: CounterName) -> StoreResult<Option<i64>> {
        let key = counter_key(subject, counter);
        match self.store.get(&key).await? {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|e| StoreError::InvalidValue { key, reason: e.to_string() }),
            None => Ok(None),
        }
    }

    /// Replace the stored value.
    pub async fn overwrite(&self, subject: UserId, counter: CounterName, value: u64) -> StoreResult<()> {
        let key = counter_key(subject, counter);
        self.store.set(&key, &value.to_string(), None).await?;
        tracing::info!(key = %key, value, "counter overwritten");
        Ok(())
    }

    /// Remove the stored value so it reads as zero until reconciled.
    pub async fn reset(&self, subject: UserId, counter: CounterName) -> StoreResult<bool> {
        let key = counter_key(subject, counter);
        let existed = self.store.delete(&key).await?;
        tracing::info!(key = %key, existed, "counter reset");
        Ok(existed)
    }
}
