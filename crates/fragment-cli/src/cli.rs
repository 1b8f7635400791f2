//! CLI argument parsing using clap derive

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Fragment Manager - keep delimited fragments present in (or absent from) files
#[derive(Parser, Debug)]
#[command(name = "fragment")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Report what a fix would change, without touching the file
    ///
    /// Examples:
    ///   fragment check /etc/hosts --id db --payload "10.0.0.5 db"
    ///   fragment check /etc/hosts --id db --payload x --absent --undo-out undo.toml
    Check(PhaseArgs),

    /// Apply the change, keeping the original in the trash
    Fix(PhaseArgs),

    /// Replay a persisted undo recipe
    Undo {
        /// Recipe file written by `check --undo-out` (.toml, .json, .yaml)
        #[arg(long)]
        recipe: PathBuf,
    },
}

/// Arguments shared by `check` and `fix`
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct PhaseArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Transaction id; its first 8 characters name the backup
    #[arg(long, env = "FRAGMENT_TXN")]
    pub txn: Option<String>,

    /// Output as JSON for scripting
    #[arg(long)]
    pub json: bool,

    /// Write the undo recipe to this file (.toml, .json, .yaml)
    #[arg(long, value_name = "FILE")]
    pub undo_out: Option<PathBuf>,
}

/// The fragment request, from flags and/or a request file
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestArgs {
    /// Target file
    pub path: Option<PathBuf>,

    /// Fragment identifier
    #[arg(long)]
    pub id: Option<String>,

    /// Fragment body
    #[arg(long)]
    pub payload: Option<String>,

    /// Ensure the fragment is removed instead of present
    #[arg(long)]
    pub absent: bool,

    /// Insert new fragments at the top of the file
    #[arg(long)]
    pub top: bool,

    /// Comment syntax for marker lines, e.g. "#", "//", "<!-- -->"
    #[arg(long)]
    pub comment_style: Option<String>,

    /// Word identifying who owns the markers
    #[arg(long)]
    pub label: Option<String>,

    /// Replace the lines matching this regex with the fragment
    #[arg(long)]
    pub replace_pattern: Option<String>,

    /// Treat the file as satisfied when this regex matches
    #[arg(long)]
    pub good_pattern: Option<String>,

    /// Attribute for the begin marker (repeatable)
    #[arg(long = "attr", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub attrs: Vec<(String, String)>,

    /// Load the request from a file; flags override its values
    #[arg(long, value_name = "FILE")]
    pub request: Option<PathBuf>,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}
