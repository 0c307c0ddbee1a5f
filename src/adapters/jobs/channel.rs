//! Job dispatchers that hand work to an in-process consumer or just record
//! the trigger in the log.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::BackgroundJob;
use crate::domain::ports::JobDispatcher;

/// Sends jobs over an unbounded tokio channel to whatever worker owns the
/// receiving end.
#[derive(Debug, Clone)]
pub struct ChannelJobDispatcher {
    sender: mpsc::UnboundedSender<BackgroundJob>,
}

impl ChannelJobDispatcher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BackgroundJob>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl JobDispatcher for ChannelJobDispatcher {
    async fn dispatch(&self, job: BackgroundJob) -> DomainResult<()> {
        let name = job.name();
        self.sender
            .send(job)
            .map_err(|_| DomainError::ExecutionFailed(format!("job queue closed, dropped {name}")))
    }
}

/// Logs every trigger and drops the job. Used by the CLI, where no worker
/// process is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingJobDispatcher;

#[async_trait]
impl JobDispatcher for TracingJobDispatcher {
    async fn dispatch(&self, job: BackgroundJob) -> DomainResult<()> {
        tracing::info!(job = job.name(), payload = ?job, "background job triggered");
        Ok(())
    }
}
