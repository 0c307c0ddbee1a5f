use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::DomainResult;
use crate::domain::models::{CounterName, NewTask, Task, TaskId, UserId};
use crate::domain::ports::record_source::{ScopedRecordSource, TaskScope};

/// Repository port for task persistence operations
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a new task and return it with its assigned id
    async fn create(&self, creator: UserId, task: &NewTask) -> DomainResult<Task>;

    /// Get a task by ID
    async fn get(&self, id: TaskId) -> DomainResult<Option<Task>>;

    /// Update an existing task
    async fn update(&self, task: &Task) -> DomainResult<()>;

    /// Delete a task by ID
    async fn delete(&self, id: TaskId) -> DomainResult<()>;

    /// Live relational count backing a counter
    async fn count_for_counter(&self, subject: UserId, counter: CounterName) -> DomainResult<u64>;

    /// Mark completed tasks finished before `cutoff` as archived
    async fn archive_completed_before(&self, cutoff: DateTime<Utc>) -> DomainResult<u64>;

    /// Open, assigned tasks due in `[from, to]`, soonest first
    async fn list_due_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DomainResult<Vec<Task>>;

    /// A record source restricted to `scope`
    fn scoped(&self, scope: TaskScope) -> Box<dyn ScopedRecordSource>;
}
