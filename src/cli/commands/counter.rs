//! Implementation of the `taskboard counter` commands.

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::cli::parse_counter;
use crate::domain::models::{CounterName, CounterRecord, ReconcilePolicy, UserId};
use crate::infrastructure::AppContext;
use crate::services::ReconcileOutcome;

#[derive(Subcommand, Debug)]
pub enum CounterCommands {
    /// Read counters for a user (all counters unless one is named)
    Get {
        /// User id
        #[arg(long, short)]
        user: i64,

        /// created_count or assigned_count
        #[arg(value_parser = parse_counter)]
        counter: Option<CounterName>,
    },

    /// Drop a stored counter so it reads as zero until reconciled
    Reset {
        #[arg(long, short)]
        user: i64,

        #[arg(value_parser = parse_counter)]
        counter: CounterName,
    },

    /// Compare counters with the database and repair them
    Reconcile {
        #[arg(long, short)]
        user: i64,

        #[arg(value_parser = parse_counter)]
        counter: Option<CounterName>,

        /// Overwrite any mismatch, not only missing or zero values
        #[arg(long)]
        full: bool,
    },
}

#[derive(Debug, Serialize)]
pub struct CounterListOutput {
    pub counters: Vec<CounterRecord>,
}

impl CommandOutput for CounterListOutput {
    fn to_human(&self) -> String {
        TableFormatter::new().format_counters(&self.counters)
    }
}

#[derive(Debug, Serialize)]
pub struct ResetOutput {
    pub user_id: UserId,
    pub counter: CounterName,
    pub existed: bool,
}

impl CommandOutput for ResetOutput {
    fn to_human(&self) -> String {
        if self.existed {
            format!("Reset {} for user {}", self.counter, self.user_id)
        } else {
            format!("{} for user {} was not stored", self.counter, self.user_id)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReconcileEntry {
    pub counter: CounterName,
    pub outcome: String,
    pub stored: Option<i64>,
    pub value: u64,
}

#[derive(Debug, Serialize)]
pub struct ReconcileOutput {
    pub user_id: UserId,
    pub policy: ReconcilePolicy,
    pub results: Vec<ReconcileEntry>,
}

impl CommandOutput for ReconcileOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("Reconciled user {} ({})", self.user_id, self.policy.as_str())];
        for entry in &self.results {
            lines.push(format!("  {:<16} {:<9} value={}", entry.counter.as_str(), entry.outcome, entry.value));
        }
        lines.join("\n")
    }
}

impl ReconcileEntry {
    fn new(counter: CounterName, outcome: &ReconcileOutcome) -> Self {
        let (label, stored, value) = match outcome {
            ReconcileOutcome::InSync { value } => ("in_sync", i64::try_from(*value).ok(), *value),
            ReconcileOutcome::Repaired { previous, value } => ("repaired", *previous, *value),
            ReconcileOutcome::Drifted { stored, actual } => ("drifted", Some(*stored), *actual),
            ReconcileOutcome::Skipped { .. } => ("skipped", None, 0),
        };
        Self {
            counter,
            outcome: label.to_string(),
            stored,
            value,
        }
    }
}

fn selected(counter: Option<CounterName>) -> Vec<CounterName> {
    counter.map_or_else(|| CounterName::ALL.to_vec(), |c| vec![c])
}

pub async fn execute(command: CounterCommands, context: &AppContext, json_mode: bool) -> Result<()> {
    match command {
        CounterCommands::Get { user, counter } => {
            let mut counters = Vec::new();
            for name in selected(counter) {
                counters.push(context.counters.read_record(UserId(user), name).await?);
            }
            output(&CounterListOutput { counters }, json_mode);
        }
        CounterCommands::Reset { user, counter } => {
            let existed = context
                .counters
                .reset(UserId(user), counter)
                .await
                .context("Counter store unavailable")?;
            output(
                &ResetOutput {
                    user_id: UserId(user),
                    counter,
                    existed,
                },
                json_mode,
            );
        }
        CounterCommands::Reconcile { user, counter, full } => {
            let policy = if full { ReconcilePolicy::Full } else { context.reconciler.policy() };
            let mut results = Vec::new();
            for name in selected(counter) {
                let outcome = context.reconciler.reconcile_with(UserId(user), name, policy).await?;
                results.push(ReconcileEntry::new(name, &outcome));
            }
            output(
                &ReconcileOutput {
                    user_id: UserId(user),
                    policy,
                    results,
                },
                json_mode,
            );
        }
    }
    Ok(())
}
