//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tradeloop")]
#[command(author, version, about = "Tick-driven strategy client")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Log level; overrides the configured level
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay CSV bars through the strategy against the paper broker
    Replay(ReplayArgs),
    /// List available strategies
    Strategies,
    /// Validate configuration
    ValidateConfig,
}

#[derive(clap::Args)]
pub struct ReplayArgs {
    /// Data file (CSV)
    #[arg(short, long)]
    pub data: PathBuf,

    /// Symbol the data belongs to; defaults to the first configured symbol
    #[arg(short, long)]
    pub symbol: Option<String>,

    /// Delay between ticks in milliseconds
    #[arg(long, default_value = "0")]
    pub tick_interval_ms: u64,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    pub output: String,
}
