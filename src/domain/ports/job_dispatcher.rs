use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::BackgroundJob;

/// Hands background work to whatever transport executes it.
#[async_trait]
pub trait JobDispatcher: Send + Sync {
    async fn dispatch(&self, job: BackgroundJob) -> DomainResult<()>;
}
