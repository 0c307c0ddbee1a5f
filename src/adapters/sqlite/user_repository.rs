//! SQLite implementation of the UserRepository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use super::{format_datetime, parse_datetime};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{NewUser, Role, User, UserId};
use crate::domain::ports::UserRepository;

#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: &NewUser) -> DomainResult<User> {
        let email = user.normalized_email();
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::ValidationFailed(format!("Invalid email: {}", user.email)));
        }

        let now = Utc::now();
        let result = sqlx::query("INSERT INTO users (email, name, role, created_at) VALUES (?, ?, ?, ?)")
            .bind(&email)
            .bind(&user.name)
            .bind(user.role.as_str())
            .bind(format_datetime(now))
            .execute(&self.pool)
            .await?;

        Ok(User {
            id: UserId(result.last_insert_rowid()),
            email,
            name: user.name.clone(),
            role: user.role,
            created_at: now,
        })
    }

    async fn get(&self, id: UserId) -> DomainResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(User::try_from).collect()
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    name: String,
    role: String,
    created_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid role: {}", row.role)))?;

        Ok(User {
            id: UserId(row.id),
            email: row.email,
            name: row.name,
            role,
            created_at: parse_datetime(&row.created_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    #[tokio::test]
    async fn test_create_normalizes_email() {
        let repo = SqliteUserRepository::new(create_migrated_test_pool().await.unwrap());
        let user = repo.create(&NewUser::new(" Ada@Example.com", "Ada", Role::Admin)).await.unwrap();

        let stored = repo.get(user.id).await.unwrap().unwrap();
        assert_eq!(stored.email, "ada@example.com");
        assert_eq!(stored.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let repo = SqliteUserRepository::new(create_migrated_test_pool().await.unwrap());
        repo.create(&NewUser::new("ada@example.com", "Ada", Role::Member)).await.unwrap();

        let result = repo.create(&NewUser::new("ADA@example.com", "Ada Again", Role::Member)).await;
        assert!(matches!(result, Err(DomainError::DatabaseError(_))));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_email_is_rejected() {
        let repo = SqliteUserRepository::new(create_migrated_test_pool().await.unwrap());
        let result = repo.create(&NewUser::new("not-an-email", "Nobody", Role::Member)).await;
        assert!(matches!(result, Err(DomainError::ValidationFailed(_))));
    }
}
