// src/types.rs

//! Crate-wide event and work-item types.

use std::fmt;

use tokio::sync::oneshot;

/// Category of a command failure delivered to the output handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The shell process could not be spawned at all.
    Launch,
    /// The process started but an execution-level error occurred
    /// (I/O failure while reading output or reaping the child).
    Runtime,
    /// The command exceeded its wall-clock budget and was killed.
    Timeout,
}

/// Event delivered to a command's output handler.
///
/// Failures travel through the same handler as ordinary output; no error
/// from a running command ever escapes the execution layer. Callers that
/// only care about text can match [`OutputEvent::Chunk`]; callers that
/// need structured error dispatch match [`OutputEvent::Failure`] instead
/// of pattern-matching message strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    /// A decoded chunk of the child's merged stdout/stderr stream.
    ///
    /// Chunk boundaries follow pipe reads, not line breaks: one chunk may
    /// contain several lines, and a single line may arrive split across
    /// chunks.
    Chunk(String),
    /// A recovered per-command failure. For [`FailureKind::Timeout`] the
    /// detail is exactly `"<command> timed-out"`; for the other kinds it
    /// carries the underlying error description.
    Failure { kind: FailureKind, detail: String },
}

/// Caller-supplied callback receiving a command's output events.
///
/// Invoked synchronously on the executor's worker task, never on the
/// submitter's task; handlers touching shared state must synchronize
/// accordingly.
pub type OutputHandler = Box<dyn FnMut(OutputEvent) + Send + 'static>;

/// Item traveling through the command queue.
///
/// Shutdown is a distinct variant rather than a reserved command string,
/// so no legitimate shell command can collide with it.
pub enum WorkItem {
    /// A trimmed, non-empty command and the handler that receives its
    /// output. Ownership transfers to the dispatch loop on enqueue.
    Command {
        command: String,
        handler: OutputHandler,
    },
    /// Shutdown control message; `ack` fires when the loop dequeues it.
    Shutdown { ack: oneshot::Sender<()> },
}

impl fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkItem::Command { command, .. } => f
                .debug_struct("Command")
                .field("command", command)
                .finish_non_exhaustive(),
            WorkItem::Shutdown { .. } => f.debug_struct("Shutdown").finish_non_exhaustive(),
        }
    }
}
