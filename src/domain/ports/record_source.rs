use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Subject, TaskStatus, TaskSummary, UserId};

/// Which tasks a viewer may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskScope {
    /// Every task.
    All,
    /// Tasks the user created or is assigned to.
    Participant(UserId),
}

impl TaskScope {
    /// Administrators and managers see everything; members see only tasks
    /// they participate in.
    pub fn for_subject(subject: Subject) -> Self {
        if subject.role.is_privileged() {
            Self::All
        } else {
            Self::Participant(subject.id)
        }
    }
}

/// An already permission-filtered view over tasks.
///
/// Aggregation functions read only through this trait. Every list operation
/// returns summaries with the related users attached, so no further
/// per-task queries are needed.
#[async_trait]
pub trait ScopedRecordSource: Send + Sync {
    /// Task counts grouped by status. Statuses with no tasks are absent.
    async fn count_by_status(&self) -> DomainResult<BTreeMap<TaskStatus, u64>>;

    /// Open tasks whose due date is before `now`.
    async fn count_overdue(&self, now: DateTime<Utc>) -> DomainResult<u64>;

    /// Most recently created tasks, newest first.
    async fn list_recent(&self, limit: usize) -> DomainResult<Vec<TaskSummary>>;

    /// Incomplete tasks assigned to `assignee`, newest first.
    async fn list_assigned_incomplete(
        &self,
        assignee: UserId,
        limit: usize,
    ) -> DomainResult<Vec<TaskSummary>>;
}
