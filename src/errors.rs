// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! These cover construction and configuration paths only. Failures of
//! individual commands never surface here; they are delivered to the
//! command's handler as [`crate::types::OutputEvent::Failure`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunqError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RunqError>;
