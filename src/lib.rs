// src/lib.rs

//! `runq` — serialized asynchronous shell-command execution.
//!
//! One [`Executor`] owns one background worker. Callers submit command
//! strings together with an output handler; the worker runs each command
//! through the system shell, one at a time, streaming merged
//! stdout/stderr back to the handler in chunks and enforcing a
//! wall-clock timeout per command. Submission only blocks on queue
//! backpressure, never on command completion.
//!
//! ```no_run
//! use runq::{Executor, ExecutorConfig, OutputEvent};
//!
//! # async fn demo() {
//! let mut exec = Executor::new(ExecutorConfig::default());
//! exec.start();
//!
//! exec.submit("echo hello", Box::new(|event| match event {
//!     OutputEvent::Chunk(text) => print!("{text}"),
//!     OutputEvent::Failure { kind, detail } => eprintln!("{kind:?}: {detail}"),
//! }))
//! .await;
//!
//! let ack = exec.stop().await;
//! let _ = ack.await;
//! # }
//! ```
//!
//! Failures of individual commands (launch errors, runtime errors,
//! timeouts) are delivered through the same handler as ordinary output,
//! as [`OutputEvent::Failure`]; they never terminate the worker.

pub mod config;
pub mod errors;
pub mod exec;
pub mod executor;
pub mod logging;
pub mod queue;
pub mod types;

pub use config::ExecutorConfig;
pub use executor::Executor;
pub use queue::SubmitOutcome;
pub use types::{FailureKind, OutputEvent, OutputHandler};
