//! Command-line interface for politeness-bench.
//!
//! Provides the `run`, `generate` and `evaluate` commands.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands};
