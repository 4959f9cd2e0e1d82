//! Command-line interface for newsforge.
//!
//! Provides the `run` and `status` commands.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands, RunArgs, StatusArgs};
