//! Tick-driven strategy client.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use tradeloop_config::load_config;
use tradeloop_monitor::setup_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Command-line flags win over the file; a broken file still gets
    // default logging so validate-config can report it.
    let logging = load_config(&cli.config)
        .map(|config| config.logging)
        .unwrap_or_default();
    let level = cli
        .log_level
        .map_or(logging.level.as_str(), |level| level.as_str());
    let json = cli.json_logs || logging.format == "json";
    let _guard = setup_logging(level, json, logging.file.as_deref().map(Path::new));

    match cli.command {
        Commands::Replay(args) => cli::commands::replay::run(args, &cli.config).await,
        Commands::Strategies => cli::commands::strategies::run().await,
        Commands::ValidateConfig => cli::commands::validate::run(&cli.config).await,
    }
}
