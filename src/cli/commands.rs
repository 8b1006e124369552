//! CLI commands and argument parsing

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Incremental catalog feed synchronizer
#[derive(Parser, Debug)]
#[command(name = "catalog-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Cursor file (overrides the configuration file)
    #[arg(short, long, global = true)]
    pub cursor: Option<PathBuf>,

    /// Output format for package operations
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drain the feed once into stdout without touching the cursor file
    Dump {
        /// Start after this commit timestamp instead of the configured start
        #[arg(long)]
        since: Option<DateTime<Utc>>,
    },

    /// Keep processing batches until interrupted
    Run,

    /// Process a single batch; exits non-zero when it failed
    Once,

    /// Inspect or move the cursor
    Cursor {
        #[command(subcommand)]
        action: CursorCommand,
    },
}

/// Cursor subcommands
#[derive(Subcommand, Debug)]
pub enum CursorCommand {
    /// Print the stored cursor value
    Show,

    /// Overwrite the stored cursor value
    Set {
        /// New value (RFC 3339)
        value: DateTime<Utc>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one operation per line)
    Json,
    /// Human-readable output
    Pretty,
}
