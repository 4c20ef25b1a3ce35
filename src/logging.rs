// src/logging.rs

//! Logging setup for `runq` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `RUNQ_LOG` environment variable (e.g. "info", "debug")
//! 2. default to `info`
//!
//! Logs are sent to STDERR so that host-application stdout stays free
//! for command output.

use crate::errors::Result;
use tracing_subscriber::fmt;

/// Initialise global logging subscriber.
///
/// Optional: `runq` is a library and hosts usually install their own
/// subscriber. Safe to call once at startup; calling it twice panics,
/// as `tracing` only accepts one global default.
pub fn init_logging() -> Result<()> {
    let level = std::env::var("RUNQ_LOG")
        .ok()
        .and_then(|s| parse_level_str(&s))
        .unwrap_or(tracing::Level::INFO);

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
