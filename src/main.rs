//! Taskboard CLI entry point.

use clap::Parser;

use taskboard::cli::commands::{archive, counter, dashboard, init, invalidate, reconcile, remind, task, user};
use taskboard::cli::{handle_error, load_config, Cli, Commands};
use taskboard::infrastructure::logging::{LogConfig, LoggerImpl};
use taskboard::infrastructure::AppContext;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    let _logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    if let Err(err) = run(cli.command, config, cli.json).await {
        handle_error(err, cli.json);
    }
}

async fn run(command: Commands, config: taskboard::Config, json: bool) -> anyhow::Result<()> {
    if let Commands::Init(args) = command {
        return init::execute(args, json).await;
    }

    let context = AppContext::build(config).await?;
    match command {
        Commands::Init(_) => Ok(()),
        Commands::Dashboard(args) => dashboard::execute(args, &context, json).await,
        Commands::Counter(command) => counter::execute(command, &context, json).await,
        Commands::ReconcileAll(args) => reconcile::execute(args, &context, json).await,
        Commands::Invalidate(args) => invalidate::execute(args, &context, json).await,
        Commands::Archive(args) => archive::execute(args, &context, json).await,
        Commands::Remind => remind::execute(&context, json).await,
        Commands::User(command) => user::execute(command, &context, json).await,
        Commands::Task(command) => task::execute(command, &context, json).await,
    }
}
