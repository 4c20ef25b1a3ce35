// src/config.rs

//! Executor configuration.
//!
//! [`ExecutorConfig`] is the in-memory form used by the rest of the
//! crate; [`RawConfigFile`] is the TOML-facing serde model. Hosts that
//! configure `runq` programmatically build an `ExecutorConfig` directly
//! (usually starting from `Default`); hosts with a config file go
//! through [`load_and_validate`].

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::{Result, RunqError};

/// Execution `PATH` used for spawned commands unless overridden.
///
/// A minimal explicit search path avoids shell-alias and
/// environment-variable surprises in spawned commands; the rest of the
/// caller's environment is inherited unchanged.
pub const DEFAULT_PATH_ENV: &str = "/usr/local/bin:/usr/bin:/bin";

const DEFAULT_QUEUE_CAPACITY: usize = 10;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Runtime configuration of an [`crate::Executor`].
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Command queue capacity; `0` means unbounded. A bounded queue
    /// exerts backpressure on submitters, it never drops commands.
    pub queue_capacity: usize,
    /// Wall-clock budget per command; the process is killed once it is
    /// exceeded.
    pub timeout: Duration,
    /// How long the dispatch loop waits on an empty queue before
    /// re-checking its stop flag. Bounds stop latency, not throughput.
    pub poll_interval: Duration,
    /// Shell program to hand commands to (`<shell> -c <command>`).
    /// `None` picks the platform default (`sh` on Unix, `cmd /C` on
    /// Windows).
    pub shell: Option<String>,
    /// `PATH` override for spawned commands; `None` inherits the
    /// caller's `PATH` untouched.
    pub path_env: Option<String>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            shell: None,
            path_env: Some(DEFAULT_PATH_ENV.to_string()),
        }
    }
}

/// TOML-facing configuration model.
///
/// All fields are optional; missing fields take the defaults above.
/// Durations are strings like `"250ms"`, `"10s"`, `"1m"`, `"2h"`.
/// An empty `path_env` string means "inherit the caller's PATH".
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub queue_capacity: Option<usize>,
    #[serde(default)]
    pub timeout: Option<String>,
    #[serde(default)]
    pub poll_interval: Option<String>,
    #[serde(default)]
    pub shell: Option<String>,
    #[serde(default)]
    pub path_env: Option<String>,
}

impl TryFrom<RawConfigFile> for ExecutorConfig {
    type Error = RunqError;

    fn try_from(raw: RawConfigFile) -> Result<Self> {
        let defaults = ExecutorConfig::default();

        let timeout = match raw.timeout {
            Some(s) => parse_duration(&s).map_err(RunqError::ConfigError)?,
            None => defaults.timeout,
        };
        let poll_interval = match raw.poll_interval {
            Some(s) => parse_duration(&s).map_err(RunqError::ConfigError)?,
            None => defaults.poll_interval,
        };

        if timeout.is_zero() {
            return Err(RunqError::ConfigError(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if poll_interval.is_zero() {
            return Err(RunqError::ConfigError(
                "poll_interval must be greater than zero".to_string(),
            ));
        }

        let path_env = match raw.path_env {
            Some(s) if s.is_empty() => None,
            Some(s) => Some(s),
            None => defaults.path_env,
        };

        Ok(ExecutorConfig {
            queue_capacity: raw.queue_capacity.unwrap_or(defaults.queue_capacity),
            timeout,
            poll_interval,
            shell: raw.shell,
            path_env,
        })
    }
}

/// Load a configuration file from a given path and return the raw
/// [`RawConfigFile`].
///
/// This only performs TOML deserialization; it does **not** perform
/// semantic validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
///
/// This is the recommended entry point for file-based configuration:
///
/// - Reads TOML.
/// - Applies defaults for missing fields.
/// - Parses duration strings and rejects zero durations.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ExecutorConfig> {
    let raw = load_from_path(&path)?;
    let config = ExecutorConfig::try_from(raw)?;
    Ok(config)
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}
