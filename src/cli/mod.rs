//! Command-line interface definitions.

pub mod banner;
pub mod resume;
pub mod run;
pub mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// arbiter - prediction-market arbitrage and directional trading bot.
#[derive(Parser, Debug)]
#[command(name = "arbiter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the trading bot in the foreground until SIGINT/SIGTERM (default).
    Run(RunArgs),

    /// Print halt state, today's P&L, and open position count from the store.
    Status,

    /// Clear a sticky risk halt recorded in the store.
    Resume,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Skip the ASCII art banner
    #[arg(long)]
    pub no_banner: bool,

    /// Detect opportunities but don't execute trades
    #[arg(long)]
    pub dry_run: bool,

    /// Override log level (debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use JSON log format instead of pretty
    #[arg(long)]
    pub json_logs: bool,
}
