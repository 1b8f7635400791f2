//! Fragment Manager CLI
//!
//! Runs one check or fix of a fragment transaction, or replays an undo recipe.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands};
use error::{CliError, Result};
use fragment_core::Phase;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        if let Some(hint) = e.hint() {
            eprintln!("{}: {}", "hint".cyan().bold(), hint);
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Check(args) => commands::run_phase(&args, Phase::Check),
        Commands::Fix(args) => commands::run_phase(&args, Phase::Fix),
        Commands::Undo { recipe } => commands::run_undo(&recipe),
    }
}

/// `-v` turns on debug output; otherwise `RUST_LOG` decides, defaulting to warnings.
fn init_tracing(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| CliError::user(format!("Failed to set tracing subscriber: {e}")))?;
    tracing::debug!(verbose, "Tracing initialized");
    Ok(())
}
