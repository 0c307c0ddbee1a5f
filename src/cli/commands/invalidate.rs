//! Implementation of the `taskboard invalidate` command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::cli::parse_role;
use crate::domain::models::{Role, UserId};
use crate::infrastructure::AppContext;

#[derive(Args, Debug)]
pub struct InvalidateArgs {
    /// admin, manager, or member
    #[arg(long, short, value_parser = parse_role)]
    pub role: Role,

    /// Only this user's view; the whole role when omitted
    #[arg(long, short)]
    pub user: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct InvalidateOutput {
    pub role: Role,
    pub user_id: Option<UserId>,
    pub evicted: Vec<String>,
    pub advanced_generation: Option<u64>,
    pub failures: usize,
}

impl CommandOutput for InvalidateOutput {
    fn to_human(&self) -> String {
        let target = self
            .user_id
            .map_or_else(|| format!("role {}", self.role), |id| format!("user {id} ({})", self.role));
        let mut lines = vec![format!("Invalidated cached dashboards for {target}")];
        for key in &self.evicted {
            lines.push(format!("  evicted {key}"));
        }
        if let Some(generation) = self.advanced_generation {
            lines.push(format!("  {} cohort now at generation {generation}", self.role));
        }
        if self.failures > 0 {
            lines.push(format!(
                "  {} store operation(s) failed; affected entries expire with their tier",
                self.failures
            ));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: InvalidateArgs, context: &AppContext, json_mode: bool) -> Result<()> {
    let user_id = args.user.map(UserId);
    let report = context.invalidation.invalidate(args.role, user_id).await;

    output(
        &InvalidateOutput {
            role: args.role,
            user_id,
            evicted: report.evicted.iter().map(ToString::to_string).collect(),
            advanced_generation: report.advanced.first().map(|token| token.value),
            failures: report.failures,
        },
        json_mode,
    );
    Ok(())
}
