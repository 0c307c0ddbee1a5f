//! Implementation of the `taskboard dashboard` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::errors::DomainError;
use crate::domain::models::{DashboardPayload, Role, UserId};
use crate::domain::ports::UserRepository;
use crate::infrastructure::AppContext;

#[derive(Args, Debug)]
pub struct DashboardArgs {
    /// Viewer's user id
    #[arg(long, short)]
    pub user: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardOutput {
    pub user_id: UserId,
    pub name: String,
    pub role: Role,
    pub dashboard: DashboardPayload,
}

impl CommandOutput for DashboardOutput {
    fn to_human(&self) -> String {
        format!(
            "Dashboard for {} ({}, {})\n{}",
            self.name,
            self.user_id,
            self.role,
            TableFormatter::new().format_dashboard(&self.dashboard)
        )
    }
}

pub async fn execute(args: DashboardArgs, context: &AppContext, json_mode: bool) -> Result<()> {
    let id = UserId(args.user);
    let viewer = context
        .users
        .get(id)
        .await?
        .ok_or(DomainError::UserNotFound(id))?;

    let dashboard = context
        .dashboard
        .get_aggregate(viewer.subject())
        .await
        .context("Failed to build dashboard")?;

    output(
        &DashboardOutput {
            user_id: viewer.id,
            name: viewer.name,
            role: viewer.role,
            dashboard,
        },
        json_mode,
    );
    Ok(())
}
