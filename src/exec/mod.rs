// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`runner`] runs a single command: shell spawn, merged output
//!   streaming, timeout enforcement, failure mapping.
//! - [`dispatch`] owns the background loop that pulls commands off the
//!   queue and drives the runner, strictly one command at a time.

pub mod dispatch;
pub mod runner;

pub use dispatch::spawn_dispatcher;
