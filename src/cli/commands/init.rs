//! Implementation of the `taskboard init` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::adapters::sqlite::initialize_database;
use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::setup::{create_config_file, SetupPaths};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration file
    #[arg(long, short)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub config_file: PathBuf,
    pub config_written: bool,
    pub database_path: String,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if self.config_written {
            lines.push(format!("  Config:   {}", self.config_file.display()));
        } else {
            lines.push(format!("  Config:   {} (kept existing)", self.config_file.display()));
        }
        lines.push(format!("  Database: {}", self.database_path));
        lines.join("\n")
    }
}

pub async fn execute(args: InitArgs, json_mode: bool) -> Result<()> {
    let target = if args.path.is_absolute() {
        args.path.clone()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(&args.path)
    };

    let paths = SetupPaths::under(&target);
    let config_written = create_config_file(&paths, args.force)?;

    let mut config = ConfigLoader::load_from_file(&paths.config_file)?;
    let database_path = PathBuf::from(&config.database.path);
    if database_path.is_relative() {
        config.database.path = target.join(database_path).display().to_string();
    }

    let pool = initialize_database(&config.database)
        .await
        .context("Failed to initialize database")?;
    pool.close().await;

    let result = InitOutput {
        success: true,
        message: if config_written {
            "Project initialized.".to_string()
        } else {
            "Project already initialized; database verified. Use --force to rewrite the config.".to_string()
        },
        config_file: paths.config_file,
        config_written,
        database_path: config.database.path,
    };
    output(&result, json_mode);
    Ok(())
}
