// src/queue.rs

//! FIFO command queue feeding the dispatch loop.
//!
//! Built on Tokio mpsc channels: a bounded channel (backpressure on
//! `send`) or an unbounded one, chosen at construction time. The
//! receiving side only ever waits a bounded interval per `take`, so the
//! dispatch loop can re-check its stop flag between polls.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::types::{OutputHandler, WorkItem};

/// Result of a submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The command was appended to the queue tail.
    Enqueued,
    /// The command was empty after trimming and was silently dropped.
    Dropped,
    /// The queue is closed (executor stopped or gone); the command was
    /// discarded.
    Rejected,
}

/// Result of a single bounded wait on the queue.
#[derive(Debug)]
pub enum Taken {
    Item(WorkItem),
    /// The poll interval elapsed with nothing queued.
    Empty,
    /// All senders are gone; no more items will ever arrive.
    Closed,
}

/// Trim a submitted command string.
///
/// Returns `None` for whitespace-only input; such commands are dropped
/// at the submission boundary without ever reaching the queue.
pub fn normalize_command(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

enum SenderKind {
    Bounded(mpsc::Sender<WorkItem>),
    Unbounded(mpsc::UnboundedSender<WorkItem>),
}

enum ReceiverKind {
    Bounded(mpsc::Receiver<WorkItem>),
    Unbounded(mpsc::UnboundedReceiver<WorkItem>),
}

/// Sending half of the command queue. Cheap to clone.
pub struct QueueSender {
    inner: SenderKind,
}

impl Clone for QueueSender {
    fn clone(&self) -> Self {
        let inner = match &self.inner {
            SenderKind::Bounded(tx) => SenderKind::Bounded(tx.clone()),
            SenderKind::Unbounded(tx) => SenderKind::Unbounded(tx.clone()),
        };
        Self { inner }
    }
}

/// Receiving half of the command queue; owned by the dispatch loop.
pub struct QueueReceiver {
    inner: ReceiverKind,
}

/// Create a command queue. `capacity` of `0` means unbounded.
pub fn channel(capacity: usize) -> (QueueSender, QueueReceiver) {
    if capacity == 0 {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            QueueSender {
                inner: SenderKind::Unbounded(tx),
            },
            QueueReceiver {
                inner: ReceiverKind::Unbounded(rx),
            },
        )
    } else {
        let (tx, rx) = mpsc::channel(capacity);
        (
            QueueSender {
                inner: SenderKind::Bounded(tx),
            },
            QueueReceiver {
                inner: ReceiverKind::Bounded(rx),
            },
        )
    }
}

impl QueueSender {
    /// Trim and enqueue a command with its handler.
    ///
    /// On a bounded queue this awaits a free slot (backpressure); a full
    /// queue never drops the command and never errors. Whitespace-only
    /// commands are dropped without enqueueing.
    pub async fn submit(
        &self,
        command: impl Into<String>,
        handler: OutputHandler,
    ) -> SubmitOutcome {
        let raw = command.into();
        let Some(command) = normalize_command(&raw) else {
            debug!("dropping empty command at submission");
            return SubmitOutcome::Dropped;
        };

        self.push(WorkItem::Command { command, handler }).await
    }

    /// Enqueue a raw work item. Used by the facade for shutdown control.
    pub(crate) async fn push(&self, item: WorkItem) -> SubmitOutcome {
        let sent = match &self.inner {
            SenderKind::Bounded(tx) => tx.send(item).await.is_ok(),
            SenderKind::Unbounded(tx) => tx.send(item).is_ok(),
        };

        if sent {
            SubmitOutcome::Enqueued
        } else {
            debug!("command queue closed; discarding work item");
            SubmitOutcome::Rejected
        }
    }
}

impl QueueReceiver {
    /// Wait up to `poll` for the head item.
    ///
    /// `Taken::Empty` on a poll timeout is not an error; it is the
    /// dispatch loop's cue to re-check its stop flag.
    pub async fn take(&mut self, poll: Duration) -> Taken {
        let recv = async {
            match &mut self.inner {
                ReceiverKind::Bounded(rx) => rx.recv().await,
                ReceiverKind::Unbounded(rx) => rx.recv().await,
            }
        };

        match tokio::time::timeout(poll, recv).await {
            Ok(Some(item)) => Taken::Item(item),
            Ok(None) => Taken::Closed,
            Err(_elapsed) => Taken::Empty,
        }
    }
}
