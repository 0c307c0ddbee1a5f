//! Command-line interface.

pub mod commands;
pub mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::domain::models::{Config, CounterName, Role, TaskPriority};
use crate::infrastructure::config::ConfigLoader;
use commands::{
    archive::ArchiveArgs, counter::CounterCommands, dashboard::DashboardArgs, init::InitArgs,
    invalidate::InvalidateArgs, reconcile::ReconcileAllArgs, task::TaskCommands, user::UserCommands,
};

#[derive(Parser, Debug)]
#[command(name = "taskboard")]
#[command(about = "Taskboard - cached dashboards and counters over a task database", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .taskboard/config.yaml + local.yaml)
    #[arg(long, global = true, env = "TASKBOARD_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the default configuration and create the database
    Init(InitArgs),

    /// Show a user's dashboard
    Dashboard(DashboardArgs),

    /// Inspect and repair per-user counters
    #[command(subcommand)]
    Counter(CounterCommands),

    /// Reconcile every counter of every user
    ReconcileAll(ReconcileAllArgs),

    /// Invalidate cached dashboards for a role or a single user
    Invalidate(InvalidateArgs),

    /// Archive tasks completed more than N days ago
    Archive(ArchiveArgs),

    /// Queue reminders for open tasks due in the next 24 hours
    Remind,

    /// User management
    #[command(subcommand)]
    User(UserCommands),

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),
}

/// Load configuration from `path`, or from the project hierarchy.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Print an error in the selected output mode and exit non-zero.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({
            "success": false,
            "error": err.to_string(),
            "causes": err.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>(),
        });
        eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err}");
        for cause in err.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
    }
    std::process::exit(1);
}

pub(crate) fn parse_role(s: &str) -> Result<Role, String> {
    Role::from_str(s).ok_or_else(|| format!("unknown role '{s}' (expected admin, manager, or member)"))
}

pub(crate) fn parse_counter(s: &str) -> Result<CounterName, String> {
    CounterName::from_str(s)
        .ok_or_else(|| format!("unknown counter '{s}' (expected created_count or assigned_count)"))
}

pub(crate) fn parse_priority(s: &str) -> Result<TaskPriority, String> {
    TaskPriority::from_str(s).ok_or_else(|| format!("unknown priority '{s}' (expected low, medium, high, urgent)"))
}
