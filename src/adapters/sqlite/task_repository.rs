//! SQLite implementation of the TaskRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::{format_datetime, parse_datetime, parse_optional_datetime, SqliteScopedSource};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    CounterName, NewTask, Task, TaskId, TaskPriority, TaskStatus, UserId,
};
use crate::domain::ports::{ScopedRecordSource, TaskRepository, TaskScope};

#[derive(Clone)]
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn create(&self, creator: UserId, task: &NewTask) -> DomainResult<Task> {
        let now = Utc::now();
        let status = task.status.unwrap_or_default();
        let completed_at = (status == TaskStatus::Completed).then_some(now);

        let result = sqlx::query(
            r#"INSERT INTO tasks (title, description, status, priority, due_date, completed_at,
               creator_id, assignee_id, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(status.as_str())
        .bind(task.priority.as_str())
        .bind(task.due_date.map(format_datetime))
        .bind(completed_at.map(format_datetime))
        .bind(creator.0)
        .bind(task.assignee_id.map(|id| id.0))
        .bind(format_datetime(now))
        .bind(format_datetime(now))
        .execute(&self.pool)
        .await?;

        Ok(Task {
            id: TaskId(result.last_insert_rowid()),
            title: task.title.clone(),
            description: task.description.clone(),
            status,
            priority: task.priority,
            due_date: task.due_date,
            completed_at,
            creator_id: creator,
            assignee_id: task.assignee_id,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get(&self, id: TaskId) -> DomainResult<Option<Task>> {
        let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Task::try_from).transpose()
    }

    async fn update(&self, task: &Task) -> DomainResult<()> {
        let result = sqlx::query(
            r#"UPDATE tasks SET title = ?, description = ?, status = ?, priority = ?,
               due_date = ?, completed_at = ?, assignee_id = ?, updated_at = ?
               WHERE id = ?"#
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.due_date.map(format_datetime))
        .bind(task.completed_at.map(format_datetime))
        .bind(task.assignee_id.map(|id| id.0))
        .bind(format_datetime(task.updated_at))
        .bind(task.id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::TaskNotFound(task.id));
        }

        Ok(())
    }

    async fn delete(&self, id: TaskId) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::TaskNotFound(id));
        }

        Ok(())
    }

    async fn count_for_counter(&self, subject: UserId, counter: CounterName) -> DomainResult<u64> {
        let sql = match counter {
            CounterName::CreatedCount => "SELECT COUNT(*) FROM tasks WHERE creator_id = ?",
            CounterName::AssignedCount => "SELECT COUNT(*) FROM tasks WHERE assignee_id = ?",
        };

        let (count,): (i64,) = sqlx::query_as(sql)
            .bind(subject.0)
            .fetch_one(&self.pool)
            .await?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn archive_completed_before(&self, cutoff: DateTime<Utc>) -> DomainResult<u64> {
        let result = sqlx::query(
            r#"UPDATE tasks SET status = 'archived', updated_at = ?
               WHERE status = 'completed' AND completed_at < ?"#
        )
        .bind(format_datetime(Utc::now()))
        .bind(format_datetime(cutoff))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn list_due_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DomainResult<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            r#"SELECT * FROM tasks
               WHERE due_date BETWEEN ? AND ?
                 AND status NOT IN ('completed', 'archived')
                 AND assignee_id IS NOT NULL
               ORDER BY due_date, id"#
        )
        .bind(format_datetime(from))
        .bind(format_datetime(to))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Task::try_from).collect()
    }

    fn scoped(&self, scope: TaskScope) -> Box<dyn ScopedRecordSource> {
        Box::new(SqliteScopedSource::new(self.pool.clone(), scope))
    }
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: i64,
    title: String,
    description: String,
    status: String,
    priority: String,
    due_date: Option<String>,
    completed_at: Option<String>,
    creator_id: i64,
    assignee_id: Option<i64>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<TaskRow> for Task {
    type Error = DomainError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let status = TaskStatus::from_str(&row.status)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid status: {}", row.status)))?;

        let priority = TaskPriority::from_str(&row.priority)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid priority: {}", row.priority)))?;

        Ok(Task {
            id: TaskId(row.id),
            title: row.title,
            description: row.description,
            status,
            priority,
            due_date: parse_optional_datetime(row.due_date)?,
            completed_at: parse_optional_datetime(row.completed_at)?,
            creator_id: UserId(row.creator_id),
            assignee_id: row.assignee_id.map(UserId),
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteUserRepository};
    use crate::domain::models::{NewUser, Role};
    use crate::domain::ports::UserRepository;

    async fn setup() -> (SqliteTaskRepository, UserId, UserId) {
        let pool = create_migrated_test_pool().await.unwrap();
        let users = SqliteUserRepository::new(pool.clone());
        let alice = users.create(&NewUser::new("alice@example.com", "Alice", Role::Member)).await.unwrap();
        let bob = users.create(&NewUser::new("bob@example.com", "Bob", Role::Member)).await.unwrap();
        (SqliteTaskRepository::new(pool), alice.id, bob.id)
    }

    #[tokio::test]
    async fn test_create_and_get_task() {
        let (repo, alice, _) = setup().await;

        let created = repo.create(alice, &NewTask::with_title("Test Task")).await.unwrap();
        assert_eq!(created.status, TaskStatus::Pending);

        let retrieved = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(retrieved.title, "Test Task");
        assert_eq!(retrieved.creator_id, alice);
        assert_eq!(retrieved.assignee_id, None);
    }

    #[tokio::test]
    async fn test_update_missing_task_fails() {
        let (repo, alice, _) = setup().await;
        let mut task = repo.create(alice, &NewTask::with_title("Ghost")).await.unwrap();
        repo.delete(task.id).await.unwrap();

        task.title = "Still a ghost".to_string();
        let result = repo.update(&task).await;
        assert!(matches!(result, Err(DomainError::TaskNotFound(id)) if id == task.id));
    }

    #[tokio::test]
    async fn test_count_for_counter_follows_owning_columns() {
        let (repo, alice, bob) = setup().await;
        repo.create(alice, &NewTask::with_title("A").assigned_to(bob)).await.unwrap();
        repo.create(alice, &NewTask::with_title("B")).await.unwrap();
        repo.create(bob, &NewTask::with_title("C").assigned_to(bob)).await.unwrap();

        assert_eq!(repo.count_for_counter(alice, CounterName::CreatedCount).await.unwrap(), 2);
        assert_eq!(repo.count_for_counter(alice, CounterName::AssignedCount).await.unwrap(), 0);
        assert_eq!(repo.count_for_counter(bob, CounterName::CreatedCount).await.unwrap(), 1);
        assert_eq!(repo.count_for_counter(bob, CounterName::AssignedCount).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_archive_completed_before_cutoff() {
        let (repo, alice, _) = setup().await;
        let mut old = repo.create(alice, &NewTask::with_title("Old")).await.unwrap();
        old.status = TaskStatus::Completed;
        old.completed_at = Some(Utc::now() - chrono::Duration::days(40));
        repo.update(&old).await.unwrap();
        repo.create(alice, &NewTask::with_title("Fresh").with_status(TaskStatus::Completed)).await.unwrap();

        let archived = repo.archive_completed_before(Utc::now() - chrono::Duration::days(30)).await.unwrap();
        assert_eq!(archived, 1);
        assert_eq!(repo.get(old.id).await.unwrap().unwrap().status, TaskStatus::Archived);
    }

    #[tokio::test]
    async fn test_list_due_between_orders_by_due_date() {
        let (repo, alice, bob) = setup().await;
        let now = Utc::now();
        let later = repo
            .create(alice, &NewTask::with_title("Later").assigned_to(bob).with_due_date(now + chrono::Duration::hours(20)))
            .await
            .unwrap();
        let sooner = repo
            .create(alice, &NewTask::with_title("Sooner").assigned_to(bob).with_due_date(now + chrono::Duration::hours(1)))
            .await
            .unwrap();
        repo.create(alice, &NewTask::with_title("Outside").assigned_to(bob).with_due_date(now + chrono::Duration::days(2)))
            .await
            .unwrap();
        repo.create(alice, &NewTask::with_title("Overdue").assigned_to(bob).with_due_date(now - chrono::Duration::hours(1)))
            .await
            .unwrap();

        let due = repo.list_due_between(now, now + chrono::Duration::hours(24)).await.unwrap();
        assert_eq!(due.iter().map(|t| t.id).collect::<Vec<_>>(), vec![sooner.id, later.id]);
    }
}
