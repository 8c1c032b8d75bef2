// src/logging.rs

//! Logging setup for `podsync` using `tracing` + `tracing-subscriber`.
//!
//! Filter selection, first match wins:
//! 1. `--log-level` CLI flag, applied to `podsync` itself
//! 2. `PODSYNC_LOG` environment variable, in `EnvFilter` directive syntax
//!    (e.g. `debug` or `podsync::engine=trace,warn`)
//! 3. `podsync=info`
//!
//! With the flag or the default, other crates log at `warn`. Logs go to
//! STDERR; the replay report is printed on STDOUT.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "PODSYNC_LOG";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV_VAR).ok();
    let filter = build_filter(cli_level, env.as_deref())?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> Result<EnvFilter> {
    let spec = directives(cli_level, env);
    EnvFilter::try_new(&spec).with_context(|| format!("invalid {LOG_ENV_VAR} filter '{spec}'"))
}

fn directives(cli_level: Option<LogLevel>, env: Option<&str>) -> String {
    match (cli_level, env.map(str::trim).filter(|s| !s.is_empty())) {
        (Some(lvl), _) => format!("warn,podsync={}", level_name(lvl)),
        (None, Some(env)) => env.to_string(),
        (None, None) => "warn,podsync=info".to_string(),
    }
}

fn level_name(lvl: LogLevel) -> &'static str {
    match lvl {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
