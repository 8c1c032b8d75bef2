// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `podsync`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "podsync",
    version,
    about = "Reconcile pod lifecycle events into task state transitions.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `podsync.toml` in the current working directory. A missing
    /// file at the default location means built-in defaults.
    #[arg(long, value_name = "PATH", default_value = "podsync.toml")]
    pub config: String,

    /// Replay a recorded pod event scenario (TOML) against an in-memory job
    /// store and print the resulting tasks.
    #[arg(long, value_name = "PATH")]
    pub replay: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PODSYNC_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate config (and scenario), print them, but don't process
    /// any events.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
