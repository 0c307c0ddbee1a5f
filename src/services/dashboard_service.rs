//! Per-viewer dashboard aggregates.
//!
//! The dashboard is split into independently cached sections so each can
//! live on its own tier. Sections that look the same to every member of a
//! privileged cohort go under the shared key; the viewer's own assignment
//! list always goes under a personal key.

use chrono::Utc;
use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{AggregateSection, CacheKey, DashboardPayload, Section, Subject, TaskSummary};
use crate::domain::ports::{ScopedRecordSource, TaskRepository, TaskScope};
use crate::services::aggregate_cache::{AggregateCache, CacheLookup};
use crate::services::cache_keys::CacheKeyDeriver;

const DEFAULT_LIST_LIMIT: usize = 10;

pub struct DashboardService<T: TaskRepository> {
    tasks: Arc<T>,
    cache: Arc<AggregateCache>,
    keys: CacheKeyDeriver,
    list_limit: usize,
}

impl<T: TaskRepository> DashboardService<T> {
    pub fn new(tasks: Arc<T>, cache: Arc<AggregateCache>, keys: CacheKeyDeriver) -> Self {
        Self {
            tasks,
            cache,
            keys,
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }

    pub fn with_list_limit(mut self, limit: usize) -> Self {
        self.list_limit = limit;
        self
    }

    /// Dashboard for `viewer`, computed over the tasks their role may see.
    ///
    /// Store problems never surface here; only a failing relational read
    /// does, as [`DomainError::ComputeFailure`].
    pub async fn get_aggregate(&self, viewer: Subject) -> DomainResult<DashboardPayload> {
        let keys = self.keys.resolve(viewer).await;
        let source: Arc<dyn ScopedRecordSource> = Arc::from(self.tasks.scoped(TaskScope::for_subject(viewer)));
        let limit = self.list_limit;

        let aggregates = {
            let source = Arc::clone(&source);
            self.section(keys.shared.as_ref(), Section::Aggregates, move || async move {
                Ok::<_, DomainError>(AggregateSection {
                    status_counts: source.count_by_status().await?,
                    overdue_count: source.count_overdue(Utc::now()).await?,
                })
            })
        };
        let recent = {
            let source = Arc::clone(&source);
            self.section(keys.shared.as_ref(), Section::Activity, move || async move {
                source.list_recent(limit).await
            })
        };
        let assigned = {
            let source = Arc::clone(&source);
            let assignee = viewer.id;
            self.section(keys.personal.as_ref(), Section::Assigned, move || async move {
                source.list_assigned_incomplete(assignee, limit).await
            })
        };

        let (aggregates, recent, assigned): (AggregateSection, Vec<TaskSummary>, Vec<TaskSummary>) =
            tokio::try_join!(aggregates, recent, assigned)?;

        tracing::debug!(viewer_id = %viewer.id, role = %viewer.role, "dashboard assembled");
        Ok(DashboardPayload::assemble(aggregates, assigned, recent))
    }

    async fn section<S, F, Fut>(&self, key: Option<&CacheKey>, section: Section, compute: F) -> DomainResult<S>
    where
        S: serde::Serialize + serde::de::DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: std::future::Future<Output = DomainResult<S>> + Send,
    {
        let lookup: CacheLookup<S> = match key {
            Some(key) => self.cache.fetch(&key.section(section), section.tier(), compute).await?,
            None => self.cache.bypass(compute).await?,
        };
        tracing::trace!(section = section.as_str(), status = %lookup.status, "dashboard section");
        Ok(lookup.value)
    }
}
