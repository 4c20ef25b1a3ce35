// src/executor.rs

//! Public executor facade.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::ExecutorConfig;
use crate::exec::spawn_dispatcher;
use crate::queue::{self, QueueReceiver, QueueSender, SubmitOutcome};
use crate::types::{OutputHandler, WorkItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Created,
    Running,
    Stopped,
}

/// Serialized shell-command executor.
///
/// Owns one background worker that runs submitted commands strictly in
/// submission order; at most one child process is alive under an
/// executor at any instant. The instance is explicitly constructed and
/// owned by the caller, and single-shot: construct, [`start`], submit
/// any number of commands, [`stop`]. Once stopped it cannot be
/// restarted.
///
/// Dropping a started executor without calling `stop` closes the queue,
/// which also makes the worker exit.
///
/// [`start`]: Executor::start
/// [`stop`]: Executor::stop
pub struct Executor {
    config: ExecutorConfig,
    queue_tx: QueueSender,
    queue_rx: Option<QueueReceiver>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    state: State,
}

impl Executor {
    /// Create an executor in the not-running state. Commands may be
    /// submitted before `start`; they wait in the queue.
    pub fn new(config: ExecutorConfig) -> Self {
        let (queue_tx, queue_rx) = queue::channel(config.queue_capacity);
        Self {
            config,
            queue_tx,
            queue_rx: Some(queue_rx),
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
            state: State::Created,
        }
    }

    /// Start the background dispatch loop; returns immediately.
    ///
    /// Must be called from within a Tokio runtime. Calling `start` a
    /// second time, or after `stop`, is unsupported: it logs a warning
    /// and does nothing.
    pub fn start(&mut self) {
        if self.state != State::Created {
            warn!(state = ?self.state, "start() ignored; executor is single-shot");
            return;
        }

        // Receiver is always present in the Created state.
        let Some(queue_rx) = self.queue_rx.take() else {
            warn!("start() ignored; queue receiver already taken");
            return;
        };

        self.worker = Some(spawn_dispatcher(
            queue_rx,
            Arc::clone(&self.stop),
            self.config.clone(),
        ));
        self.state = State::Running;
    }

    /// Submit a command for execution, fire and forget.
    ///
    /// Trims the command; whitespace-only submissions are dropped
    /// without effect. Blocks only on queue backpressure, never on
    /// command completion. The handler is invoked on the worker task
    /// with the command's output chunks and any failure.
    pub async fn submit(
        &self,
        command: impl Into<String>,
        handler: OutputHandler,
    ) -> SubmitOutcome {
        self.queue_tx.submit(command, handler).await
    }

    /// Request shutdown.
    ///
    /// Sets the stop flag, then enqueues a shutdown control item. The
    /// worker exits within one poll interval; no further command is
    /// dispatched once `stop` has returned (already-queued commands are
    /// abandoned). The returned receiver resolves `Ok(())` when the
    /// loop dequeued and acknowledged the shutdown item, or `Err` when
    /// the loop exited on the flag before reaching it — both are normal
    /// terminal outcomes. A second `stop` has no additional effect and
    /// returns a receiver that resolves `Err`.
    pub async fn stop(&mut self) -> oneshot::Receiver<()> {
        let (ack_tx, ack_rx) = oneshot::channel();

        if self.state != State::Running {
            debug!(state = ?self.state, "stop() on a non-running executor; nothing to do");
            return ack_rx;
        }

        self.state = State::Stopped;
        self.stop.store(true, Ordering::SeqCst);

        match self.queue_tx.push(WorkItem::Shutdown { ack: ack_tx }).await {
            SubmitOutcome::Enqueued => {}
            outcome => {
                debug!(?outcome, "shutdown item not enqueued; loop exits on its stop flag")
            }
        }

        ack_rx
    }

    /// Wait for the background worker to exit. Meaningful after `stop`
    /// (or after dropping all other queue handles); a no-op if the
    /// executor never started.
    pub async fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if let Err(err) = worker.await {
                warn!(error = %err, "dispatch worker panicked");
            }
        }
    }
}
