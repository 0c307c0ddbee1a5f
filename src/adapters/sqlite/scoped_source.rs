//! Permission-scoped task reads backing dashboard aggregation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::BTreeMap;

use super::{format_datetime, parse_datetime, parse_optional_datetime};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{TaskId, TaskPriority, TaskStatus, TaskSummary, UserId, UserRef};
use crate::domain::ports::{ScopedRecordSource, TaskScope};

const SUMMARY_COLUMNS: &str = r#"t.id, t.title, t.status, t.priority, t.due_date, t.completed_at,
    t.created_at, t.updated_at,
    c.id AS creator_id, c.name AS creator_name, c.email AS creator_email,
    a.id AS assignee_id, a.name AS assignee_name, a.email AS assignee_email
    FROM tasks t
    INNER JOIN users c ON c.id = t.creator_id
    LEFT JOIN users a ON a.id = t.assignee_id"#;

/// A [`ScopedRecordSource`] over the `tasks` table.
pub struct SqliteScopedSource {
    pool: SqlitePool,
    scope: TaskScope,
}

impl SqliteScopedSource {
    pub fn new(pool: SqlitePool, scope: TaskScope) -> Self {
        Self { pool, scope }
    }

    /// SQL predicate restricting `t` to the scope, and its bound ids.
    fn scope_clause(&self) -> (&'static str, Vec<i64>) {
        match self.scope {
            TaskScope::All => ("1 = 1", Vec::new()),
            TaskScope::Participant(user) => ("(t.creator_id = ? OR t.assignee_id = ?)", vec![user.0, user.0]),
        }
    }

    async fn fetch_summaries(
        &self,
        extra_predicate: &str,
        extra_bindings: Vec<i64>,
        limit: usize,
    ) -> DomainResult<Vec<TaskSummary>> {
        let (scope_sql, scope_bindings) = self.scope_clause();
        let query = format!(
            "SELECT {SUMMARY_COLUMNS} WHERE {scope_sql} {extra_predicate} \
             ORDER BY t.created_at DESC, t.id DESC LIMIT ?"
        );

        let mut q = sqlx::query_as::<_, SummaryRow>(&query);
        for id in scope_bindings.into_iter().chain(extra_bindings) {
            q = q.bind(id);
        }
        let rows = q
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TaskSummary::try_from).collect()
    }
}

#[async_trait]
impl ScopedRecordSource for SqliteScopedSource {
    async fn count_by_status(&self) -> DomainResult<BTreeMap<TaskStatus, u64>> {
        let (scope_sql, bindings) = self.scope_clause();
        let query = format!("SELECT t.status, COUNT(*) FROM tasks t WHERE {scope_sql} GROUP BY t.status");

        let mut q = sqlx::query_as::<_, (String, i64)>(&query);
        for id in bindings {
            q = q.bind(id);
        }
        let rows = q.fetch_all(&self.pool).await?;

        let mut counts = BTreeMap::new();
        for (status_str, count) in rows {
            let status = TaskStatus::from_str(&status_str)
                .ok_or_else(|| DomainError::SerializationError(format!("Invalid status: {status_str}")))?;
            counts.insert(status, u64::try_from(count).unwrap_or(0));
        }
        Ok(counts)
    }

    async fn count_overdue(&self, now: DateTime<Utc>) -> DomainResult<u64> {
        let (scope_sql, bindings) = self.scope_clause();
        let query = format!(
            "SELECT COUNT(*) FROM tasks t WHERE {scope_sql} \
             AND t.due_date IS NOT NULL AND t.due_date < ? \
             AND t.status NOT IN ('completed', 'archived')"
        );

        let mut q = sqlx::query_as::<_, (i64,)>(&query);
        for id in bindings {
            q = q.bind(id);
        }
        let (count,) = q.bind(format_datetime(now)).fetch_one(&self.pool).await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn list_recent(&self, limit: usize) -> DomainResult<Vec<TaskSummary>> {
        self.fetch_summaries("", Vec::new(), limit).await
    }

    async fn list_assigned_incomplete(
        &self,
        assignee: UserId,
        limit: usize,
    ) -> DomainResult<Vec<TaskSummary>> {
        self.fetch_summaries(
            "AND t.assignee_id = ? AND t.status NOT IN ('completed', 'archived')",
            vec![assignee.0],
            limit,
        )
        .await
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    id: i64,
    title: String,
    status: String,
    priority: String,
    due_date: Option<String>,
    completed_at: Option<String>,
    created_at: String,
    updated_at: String,
    creator_id: i64,
    creator_name: String,
    creator_email: String,
    assignee_id: Option<i64>,
    assignee_name: Option<String>,
    assignee_email: Option<String>,
}

impl TryFrom<SummaryRow> for TaskSummary {
    type Error = DomainError;

    fn try_from(row: SummaryRow) -> Result<Self, Self::Error> {
        let status = TaskStatus::from_str(&row.status)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid status: {}", row.status)))?;
        let priority = TaskPriority::from_str(&row.priority)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid priority: {}", row.priority)))?;

        let assignee = match (row.assignee_id, row.assignee_name, row.assignee_email) {
            (Some(id), Some(name), Some(email)) => Some(UserRef { id: UserId(id), name, email }),
            _ => None,
        };

        Ok(TaskSummary {
            id: TaskId(row.id),
            title: row.title,
            status,
            priority,
            due_date: parse_optional_datetime(row.due_date)?,
            completed_at: parse_optional_datetime(row.completed_at)?,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
            creator: UserRef {
                id: UserId(row.creator_id),
                name: row.creator_name,
                email: row.creator_email,
            },
            assignee,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteTaskRepository, SqliteUserRepository};
    use crate::domain::models::{NewTask, NewUser, Role};
    use crate::domain::ports::{TaskRepository, UserRepository};
    use chrono::Duration;

    #[tokio::test]
    async fn test_participant_scope_only_sees_own_tasks() {
        let pool = create_migrated_test_pool().await.unwrap();
        let users = SqliteUserRepository::new(pool.clone());
        let tasks = SqliteTaskRepository::new(pool);
        let ann = users.create(&NewUser::new("ann@example.com", "Ann", Role::Member)).await.unwrap();
        let ben = users.create(&NewUser::new("ben@example.com", "Ben", Role::Member)).await.unwrap();

        tasks.create(ann.id, &NewTask::with_title("Ann's")).await.unwrap();
        tasks.create(ben.id, &NewTask::with_title("Ben's, for Ann").assigned_to(ann.id)).await.unwrap();
        tasks.create(ben.id, &NewTask::with_title("Ben only")).await.unwrap();

        let ann_view = tasks.scoped(TaskScope::Participant(ann.id));
        let recent = ann_view.list_recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent.iter().all(|t| t.title != "Ben only"));

        let everything = tasks.scoped(TaskScope::All);
        assert_eq!(everything.list_recent(10).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_counts_and_lists_attach_users() {
        let pool = create_migrated_test_pool().await.unwrap();
        let users = SqliteUserRepository::new(pool.clone());
        let tasks = SqliteTaskRepository::new(pool);
        let boss = users.create(&NewUser::new("boss@example.com", "Boss", Role::Admin)).await.unwrap();
        let dev = users.create(&NewUser::new("dev@example.com", "Dev", Role::Member)).await.unwrap();

        let past = Utc::now() - Duration::days(2);
        tasks.create(boss.id, &NewTask::with_title("Late").with_due_date(past).assigned_to(dev.id)).await.unwrap();
        tasks
            .create(boss.id, &NewTask::with_title("Late but done").with_due_date(past).with_status(TaskStatus::Completed))
            .await
            .unwrap();
        tasks.create(dev.id, &NewTask::with_title("Started").with_status(TaskStatus::InProgress)).await.unwrap();

        let source = tasks.scoped(TaskScope::All);
        let counts = source.count_by_status().await.unwrap();
        assert_eq!(counts.get(&TaskStatus::Pending), Some(&1));
        assert_eq!(counts.get(&TaskStatus::Completed), Some(&1));
        assert_eq!(counts.get(&TaskStatus::InProgress), Some(&1));
        assert_eq!(counts.get(&TaskStatus::Archived), None);

        assert_eq!(source.count_overdue(Utc::now()).await.unwrap(), 1);

        let assigned = source.list_assigned_incomplete(dev.id, 10).await.unwrap();
        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0].creator.name, "Boss");
        assert_eq!(assigned[0].assignee.as_ref().map(|a| a.id), Some(dev.id));
    }

    #[tokio::test]
    async fn test_list_limit_is_applied_newest_first() {
        let pool = create_migrated_test_pool().await.unwrap();
        let users = SqliteUserRepository::new(pool.clone());
        let tasks = SqliteTaskRepository::new(pool);
        let user = users.create(&NewUser::new("u@example.com", "U", Role::Manager)).await.unwrap();

        for i in 0..5 {
            tasks.create(user.id, &NewTask::with_title(format!("task {i}"))).await.unwrap();
        }

        let recent = tasks.scoped(TaskScope::All).list_recent(3).await.unwrap();
        let titles: Vec<_> = recent.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["task 4", "task 3", "task 2"]);
    }
}
