//! Scrivener CLI - Writing-Style Analysis & Alignment Engine
//!
//! Profiles documents, compares styles and runs reviewable style transfers
//! from the command line.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Commands, EngineOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let options = EngineOptions::from_cli(&cli);

    // Execute command
    match cli.command {
        Commands::Analyze(args) => {
            cli::analyze_command(args, &options).await?;
        }
        Commands::Compare(args) => {
            cli::compare_command(args, &options).await?;
        }
        Commands::Transfer(args) => {
            cli::transfer_command(args, &options).await?;
        }
        Commands::PrintDefaultConfig => {
            cli::print_default_config().await?;
        }
        Commands::InitConfig(args) => {
            cli::init_config(args).await?;
        }
        Commands::ValidateConfig(args) => {
            cli::validate_config(args, cli.verbose).await?;
        }
    }

    Ok(())
}
