//! TierShift CLI - Command-line interface
//!
//! This binary drives the TierShift library: one-shot relocation passes,
//! restore-everything sweeps, tracker migration, and status reporting.
//! Scheduling (cron, systemd timers) is the caller's concern.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use error::CliError;

#[derive(Parser)]
#[command(name = "tiershift")]
#[command(version = tiershift::VERSION)]
#[command(about = "Relocate media between array and cache storage tiers", long_about = None)]
struct Args {
    /// Path to config.ini (default: ~/.tiershift/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter (e.g. "info", "tiershift=debug")
    #[arg(long, global = true, default_value = "info")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute one relocation pass
    Run {
        /// Newline-delimited on-deck list (path or path<TAB>user per line)
        #[arg(long)]
        on_deck: Option<PathBuf>,

        /// Newline-delimited watchlist (path or path<TAB>user per line)
        #[arg(long)]
        watchlist: Option<PathBuf>,
    },

    /// Restore every cached file to the array
    RestoreAll,

    /// Print tracker and cache occupancy
    Status,

    /// Run the one-time tracker migration
    Migrate,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = init_logging(&args.log) {
        CliError::LoggingInit(e).exit();
    }

    let result = match args.command {
        Command::Run { on_deck, watchlist } => {
            commands::run::execute(args.config.as_deref(), on_deck.as_deref(), watchlist.as_deref())
                .await
        }
        Command::RestoreAll => commands::restore::execute(args.config.as_deref()).await,
        Command::Status => commands::status::execute(args.config.as_deref()),
        Command::Migrate => commands::migrate::execute(args.config.as_deref()),
    };

    if let Err(e) = result {
        e.exit();
    }
}

fn init_logging(filter: &str) -> Result<(), String> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(filter).map_err(|e| e.to_string())?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| e.to_string())
}
