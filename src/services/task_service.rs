//! Task service: the write path.
//!
//! Every mutation commits to the relational store first. Counter updates,
//! job triggers, and cache invalidation run afterwards and never fail the
//! request.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    BackgroundJob, CounterName, MutationKind, NewTask, NotificationKind, Task, TaskId, TaskMutation, TaskStatus,
    TaskUpdate, UserId,
};
use crate::domain::ports::{JobDispatcher, TaskRepository, UserRepository};
use crate::services::counter_store::CounterStore;
use crate::services::invalidation::InvalidationCoordinator;

const REMINDER_WINDOW_HOURS: i64 = 24;

pub struct TaskService<T: TaskRepository, U: UserRepository> {
    tasks: Arc<T>,
    users: Arc<U>,
    counters: Arc<CounterStore<T>>,
    invalidation: Arc<InvalidationCoordinator>,
    jobs: Arc<dyn JobDispatcher>,
}

impl<T: TaskRepository, U: UserRepository> TaskService<T, U> {
    pub fn new(
        tasks: Arc<T>,
        users: Arc<U>,
        counters: Arc<CounterStore<T>>,
        invalidation: Arc<InvalidationCoordinator>,
        jobs: Arc<dyn JobDispatcher>,
    ) -> Self {
        Self {
            tasks,
            users,
            counters,
            invalidation,
            jobs,
        }
    }

    pub async fn get(&self, task_id: TaskId) -> DomainResult<Option<Task>> {
        self.tasks.get(task_id).await
    }

    /// Create a task owned by `creator`.
    pub async fn create(&self, creator: UserId, new_task: NewTask) -> DomainResult<Task> {
        validate_title(&new_task.title)?;
        self.require_user(creator).await?;
        if let Some(assignee) = new_task.assignee_id {
            self.require_user(assignee).await?;
        }

        let task = self.tasks.create(creator, &new_task).await?;
        tracing::info!(task_id = %task.id, creator_id = %creator, "task created");

        self.counters.increment(creator, CounterName::CreatedCount).await;
        if let Some(assignee) = task.assignee_id {
            self.counters.increment(assignee, CounterName::AssignedCount).await;
            self.trigger(BackgroundJob::TaskNotification {
                task_id: task.id,
                kind: NotificationKind::Assignment,
            })
            .await;
        }

        self.after_commit(MutationKind::Created, task.id, &[Some(task.creator_id), task.assignee_id])
            .await;
        Ok(task)
    }

    /// Apply a partial update.
    pub async fn update(&self, task_id: TaskId, changes: TaskUpdate) -> DomainResult<Task> {
        let mut task = self.load(task_id).await?;
        let previous_status = task.status;
        let previous_assignee = task.assignee_id;

        if let Some(title) = changes.title {
            validate_title(&title)?;
            task.title = title;
        }
        if let Some(description) = changes.description {
            task.description = description;
        }
        if let Some(priority) = changes.priority {
            task.priority = priority;
        }
        if let Some(due_date) = changes.due_date {
            task.due_date = due_date;
        }
        if let Some(status) = changes.status {
            task.status = status;
        }
        if let Some(assignee) = changes.assignee_id {
            if let Some(id) = assignee {
                self.require_user(id).await?;
            }
            task.assignee_id = assignee;
        }

        let now = Utc::now();
        let completed_now = task.status == TaskStatus::Completed && previous_status != TaskStatus::Completed;
        stamp_completion(&mut task, now);
        task.updated_at = now;

        self.tasks.update(&task).await?;

        let reassigned = previous_assignee != task.assignee_id;
        if reassigned {
            if let Some(old) = previous_assignee {
                self.counters.decrement(old, CounterName::AssignedCount).await;
            }
            if let Some(new) = task.assignee_id {
                self.counters.increment(new, CounterName::AssignedCount).await;
                self.trigger(BackgroundJob::TaskNotification {
                    task_id: task.id,
                    kind: NotificationKind::Assignment,
                })
                .await;
            }
        }

        let kind = if reassigned {
            MutationKind::AssigneeChanged
        } else if completed_now {
            MutationKind::Completed
        } else {
            MutationKind::Updated
        };
        tracing::info!(task_id = %task.id, kind = %kind, "task updated");

        self.after_commit(kind, task.id, &[Some(task.creator_id), task.assignee_id, previous_assignee])
            .await;
        Ok(task)
    }

    /// Assign (or reassign) a task.
    pub async fn assign(&self, task_id: TaskId, assignee: UserId) -> DomainResult<Task> {
        self.update(task_id, TaskUpdate::reassign(Some(assignee))).await
    }

    /// Mark a task completed on behalf of `actor`.
    pub async fn complete(&self, task_id: TaskId, actor: UserId) -> DomainResult<Task> {
        let mut task = self.load(task_id).await?;
        let reason = match task.status {
            TaskStatus::Completed => Some("task is already completed"),
            TaskStatus::Archived => Some("archived tasks cannot be completed"),
            TaskStatus::Pending | TaskStatus::InProgress => None,
        };
        if let Some(reason) = reason {
            return Err(DomainError::InvalidStateTransition {
                from: task.status.as_str().to_string(),
                to: TaskStatus::Completed.as_str().to_string(),
                reason: reason.to_string(),
            });
        }

        let now = Utc::now();
        task.status = TaskStatus::Completed;
        stamp_completion(&mut task, now);
        task.updated_at = now;
        self.tasks.update(&task).await?;
        tracing::info!(task_id = %task.id, actor_id = %actor, "task completed");

        if actor != task.creator_id {
            self.trigger(BackgroundJob::TaskNotification {
                task_id: task.id,
                kind: NotificationKind::Completion,
            })
            .await;
        }

        self.after_commit(MutationKind::Completed, task.id, &[Some(task.creator_id), task.assignee_id])
            .await;
        Ok(task)
    }

    pub async fn delete(&self, task_id: TaskId) -> DomainResult<()> {
        let task = self.load(task_id).await?;
        self.tasks.delete(task_id).await?;
        tracing::info!(task_id = %task_id, "task deleted");

        self.counters.decrement(task.creator_id, CounterName::CreatedCount).await;
        if let Some(assignee) = task.assignee_id {
            self.counters.decrement(assignee, CounterName::AssignedCount).await;
        }

        self.after_commit(MutationKind::Deleted, task_id, &[Some(task.creator_id), task.assignee_id])
            .await;
        Ok(())
    }

    /// Archive every task completed before `cutoff`. Returns how many changed.
    ///
    /// The affected viewers are not tracked, so every cohort is invalidated.
    pub async fn archive_completed_before(&self, cutoff: DateTime<Utc>) -> DomainResult<u64> {
        let archived = self.tasks.archive_completed_before(cutoff).await?;
        tracing::info!(archived, cutoff = %cutoff, "archived completed tasks");

        if archived > 0 {
            self.trigger(BackgroundJob::TaskArchival { archived }).await;
            self.invalidation
                .on_entity_mutated(&TaskMutation::bulk(MutationKind::BulkArchived))
                .await;
        }
        Ok(archived)
    }

    /// Queue a reminder for every open, assigned task due within a day of
    /// `now`. Returns the tasks reminded about, soonest first.
    pub async fn trigger_due_reminders(&self, now: DateTime<Utc>) -> DomainResult<Vec<Task>> {
        let due = self.tasks.list_due_between(now, now + Duration::hours(REMINDER_WINDOW_HOURS)).await?;
        for task in &due {
            self.trigger(BackgroundJob::TaskReminder { task_id: task.id }).await;
        }
        tracing::info!(reminders = due.len(), "queued due-date reminders");
        Ok(due)
    }

    pub async fn request_export(&self, user: UserId) -> DomainResult<()> {
        self.require_user(user).await?;
        self.trigger(BackgroundJob::DataExport { user_id: user }).await;
        Ok(())
    }

    async fn load(&self, task_id: TaskId) -> DomainResult<Task> {
        self.tasks.get(task_id).await?.ok_or(DomainError::TaskNotFound(task_id))
    }

    async fn require_user(&self, id: UserId) -> DomainResult<()> {
        match self.users.get(id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::UserNotFound(id)),
        }
    }

    async fn trigger(&self, job: BackgroundJob) {
        let name = job.name();
        if let Err(error) = self.jobs.dispatch(job).await {
            tracing::error!(job = name, error = %error, "failed to dispatch background job");
        }
    }

    /// Invalidate caches for the users a committed mutation touched. If any
    /// of them cannot be resolved, fall back to invalidating every cohort.
    async fn after_commit(&self, kind: MutationKind, task_id: TaskId, participants: &[Option<UserId>]) {
        let mut mutation = TaskMutation::new(kind, task_id);
        for id in participants.iter().flatten() {
            match self.users.get(*id).await {
                Ok(Some(user)) => mutation = mutation.affecting(user.subject()),
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(user_id = %id, error = %error, "could not resolve affected user");
                    mutation = TaskMutation::bulk(kind);
                    break;
                }
            }
        }

        let report = self.invalidation.on_entity_mutated(&mutation).await;
        if !report.is_clean() {
            tracing::warn!(task_id = %task_id, failures = report.failures, "cache invalidation incomplete");
        }
    }
}

/// `completed_at` is kept while a task stays closed, stamped once when it
/// first closes, and cleared when it reopens.
fn stamp_completion(task: &mut Task, now: DateTime<Utc>) {
    if task.status.is_closed() {
        task.completed_at.get_or_insert(now);
    } else {
        task.completed_at = None;
    }
}

fn validate_title(title: &str) -> DomainResult<()> {
    if title.trim().is_empty() {
        return Err(DomainError::ValidationFailed("task title cannot be empty".to_string()));
    }
    Ok(())
}
