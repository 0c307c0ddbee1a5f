//! Implementation of the `taskboard archive` command.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::AppContext;

#[derive(Args, Debug)]
pub struct ArchiveArgs {
    /// Archive tasks completed more than this many days ago
    #[arg(long, default_value = "30")]
    pub older_than_days: u32,
}

#[derive(Debug, Serialize)]
pub struct ArchiveOutput {
    pub cutoff: DateTime<Utc>,
    pub archived: u64,
}

impl CommandOutput for ArchiveOutput {
    fn to_human(&self) -> String {
        format!(
            "Archived {} task(s) completed before {}",
            self.archived,
            self.cutoff.format("%Y-%m-%d %H:%M UTC")
        )
    }
}

pub async fn execute(args: ArchiveArgs, context: &AppContext, json_mode: bool) -> Result<()> {
    let cutoff = Utc::now() - Duration::days(i64::from(args.older_than_days));
    let archived = context
        .task_service
        .archive_completed_before(cutoff)
        .await
        .context("Failed to archive tasks")?;

    output(&ArchiveOutput { cutoff, archived }, json_mode);
    Ok(())
}
