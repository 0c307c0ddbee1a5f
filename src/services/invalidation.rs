//! Invalidation of cached aggregates after task mutations.
//!
//! Privileged views are shared per role and deleted by name. Member views
//! are deleted individually for every subject a mutation touches; when the
//! affected set is unknown (bulk updates) the whole cohort's generation is
//! advanced instead.

use std::sync::Arc;

use crate::domain::models::{CacheKey, Role, Subject, TaskMutation, UserId, VersionToken};
use crate::services::aggregate_cache::AggregateCache;
use crate::services::cache_keys::CacheKeyDeriver;

/// What an invalidation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationReport {
    /// Base keys whose sections were deleted.
    pub evicted: Vec<CacheKey>,
    /// Cohort generations advanced.
    pub advanced: Vec<VersionToken>,
    /// Store operations that failed. Those entries age out with their tier.
    pub failures: usize,
}

impl InvalidationReport {
    pub fn is_clean(&self) -> bool {
        self.failures == 0
    }

    fn merge(&mut self, other: InvalidationReport) {
        self.evicted.extend(other.evicted);
        self.advanced.extend(other.advanced);
        self.failures += other.failures;
    }
}

pub struct InvalidationCoordinator {
    cache: Arc<AggregateCache>,
    keys: CacheKeyDeriver,
}

impl InvalidationCoordinator {
    pub fn new(cache: Arc<AggregateCache>, keys: CacheKeyDeriver) -> Self {
        Self { cache, keys }
    }

    /// Invalidate everything a committed task mutation can have changed.
    ///
    /// Never fails: store errors are logged and counted in the report.
    pub async fn on_entity_mutated(&self, mutation: &TaskMutation) -> InvalidationReport {
        if !mutation.is_addressable() {
            tracing::info!(kind = %mutation.kind, "bulk mutation, invalidating every cohort");
            return self.invalidate_all().await;
        }

        let mut report = InvalidationReport::default();
        for role in Role::ALL.iter().filter(|r| r.is_privileged()) {
            self.evict(CacheKeyDeriver::shared_key(*role), &mut report).await;
        }
        for subject in &mutation.affected {
            self.evict_subject(*subject, &mut report).await;
        }

        tracing::debug!(
            kind = %mutation.kind,
            task_id = ?mutation.task_id,
            evicted = report.evicted.len(),
            failures = report.failures,
            "invalidated aggregates after mutation"
        );
        report
    }

    /// Invalidate one subject's view, or the whole cohort when `subject` is `None`.
    pub async fn invalidate(&self, role: Role, subject: Option<UserId>) -> InvalidationReport {
        let mut report = InvalidationReport::default();
        match subject {
            Some(id) => {
                if role.is_privileged() {
                    self.evict(CacheKeyDeriver::shared_key(role), &mut report).await;
                }
                self.evict_subject(Subject::new(id, role), &mut report).await;
            }
            None => {
                if role.is_privileged() {
                    self.evict(CacheKeyDeriver::shared_key(role), &mut report).await;
                }
                self.advance(role, &mut report).await;
            }
        }
        report
    }

    /// Invalidate every cohort.
    pub async fn invalidate_all(&self) -> InvalidationReport {
        let mut report = InvalidationReport::default();
        for role in Role::ALL {
            report.merge(self.invalidate(role, None).await);
        }
        report
    }

    async fn evict_subject(&self, subject: Subject, report: &mut InvalidationReport) {
        match self.keys.generation(subject.role).await {
            Ok(generation) => {
                let key = CacheKeyDeriver::personal_key(subject.role, subject.id, generation);
                self.evict(key, report).await;
            }
            Err(error) => {
                tracing::warn!(
                    subject_id = %subject.id,
                    role = %subject.role,
                    error = %error,
                    "cohort generation unavailable, subject view left to expire"
                );
                report.failures += 1;
            }
        }
    }

    async fn evict(&self, key: CacheKey, report: &mut InvalidationReport) {
        match self.cache.evict(&key).await {
            Ok(_) => report.evicted.push(key),
            Err(error) => {
                tracing::warn!(key = %key, error = %error, "cache eviction failed");
                report.failures += 1;
            }
        }
    }

    async fn advance(&self, role: Role, report: &mut InvalidationReport) {
        match self.keys.advance(role).await {
            Ok(token) => {
                tracing::info!(cohort = %role, generation = token.value, "advanced cohort generation");
                report.advanced.push(token);
            }
            Err(error) => {
                tracing::warn!(cohort = %role, error = %error, "failed to advance cohort generation");
                report.failures += 1;
            }
        }
    }
}
