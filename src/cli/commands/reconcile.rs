//! Implementation of the `taskboard reconcile-all` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::ReconcilePolicy;
use crate::infrastructure::AppContext;
use crate::services::ReconcileSummary;

#[derive(Args, Debug)]
pub struct ReconcileAllArgs {
    /// Overwrite any mismatch, not only missing or zero values
    #[arg(long)]
    pub full: bool,
}

#[derive(Debug, Serialize)]
pub struct ReconcileAllOutput {
    pub policy: ReconcilePolicy,
    pub checked: usize,
    pub in_sync: usize,
    pub repaired: usize,
    pub drifted: usize,
    pub skipped: usize,
}

impl ReconcileAllOutput {
    fn new(policy: ReconcilePolicy, summary: &ReconcileSummary) -> Self {
        Self {
            policy,
            checked: summary.checked,
            in_sync: summary.in_sync,
            repaired: summary.repaired,
            drifted: summary.drifted,
            skipped: summary.skipped,
        }
    }
}

impl CommandOutput for ReconcileAllOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Checked {} counter(s) with policy {}", self.checked, self.policy.as_str()),
            format!("  in sync:  {}", self.in_sync),
            format!("  repaired: {}", self.repaired),
        ];
        if self.drifted > 0 {
            lines.push(format!("  drifted:  {} (rerun with --full to overwrite)", self.drifted));
        }
        if self.skipped > 0 {
            lines.push(format!("  skipped:  {} (store unavailable)", self.skipped));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: ReconcileAllArgs, context: &AppContext, json_mode: bool) -> Result<()> {
    let policy = if args.full { ReconcilePolicy::Full } else { context.reconciler.policy() };
    let summary = context
        .reconciler
        .reconcile_all_with(policy)
        .await
        .context("Reconciliation failed")?;

    output(&ReconcileAllOutput::new(policy, &summary), json_mode);
    Ok(())
}
