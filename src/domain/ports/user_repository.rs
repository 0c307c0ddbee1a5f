use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{NewUser, User, UserId};

/// Repository port for user persistence operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &NewUser) -> DomainResult<User>;

    async fn get(&self, id: UserId) -> DomainResult<Option<User>>;

    async fn list(&self) -> DomainResult<Vec<User>>;
}
