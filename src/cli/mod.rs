//! CLI module
//!
//! Command-line host for the batch catalog processor.
//!
//! # Commands
//!
//! - `dump` - Drain the feed from the configured start and print operations
//! - `run` - Process batches on a poll interval until Ctrl-C
//! - `once` - Process one batch against the cursor
//! - `cursor show` / `cursor set` - Inspect or move the cursor file

mod commands;
mod runner;

pub use commands::{Cli, Commands, CursorCommand, OutputFormat};
pub use runner::Runner;
