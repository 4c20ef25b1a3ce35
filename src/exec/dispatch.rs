// src/exec/dispatch.rs

//! Single-worker dispatch loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::ExecutorConfig;
use crate::exec::runner;
use crate::queue::{QueueReceiver, Taken};
use crate::types::WorkItem;

/// Spawn the background dispatch loop.
///
/// The loop pulls work items off the queue and runs them strictly one
/// at a time: a dequeued command runs to completion, timeout handling
/// included, before the next `take`. Every poll cycle re-checks the
/// stop flag, so a stop request is noticed within one poll interval
/// even when the queue stays empty. The returned handle resolves once
/// the loop has exited.
pub fn spawn_dispatcher(
    mut queue: QueueReceiver,
    stop: Arc<AtomicBool>,
    config: ExecutorConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("dispatch loop started");

        loop {
            match queue.take(config.poll_interval).await {
                Taken::Empty => {
                    // Poll elapsed with nothing queued; the stop check
                    // below is the cooperative cancellation point.
                }
                Taken::Closed => {
                    debug!("command queue closed; dispatch loop exiting");
                    break;
                }
                Taken::Item(WorkItem::Shutdown { ack }) => {
                    info!("done");
                    // The receiver may already be gone; that is fine.
                    let _ = ack.send(());
                }
                Taken::Item(WorkItem::Command { command, mut handler }) => {
                    if stop.load(Ordering::SeqCst) {
                        debug!(cmd = %command, "stop requested; dropping queued command");
                        break;
                    }
                    runner::run(&command, &mut handler, &config).await;
                }
            }

            // Checked after each poll cycle, not before the take, so a
            // shutdown item that is already queued gets drained (and
            // acknowledged) rather than abandoned by a flag-first exit.
            if stop.load(Ordering::SeqCst) {
                break;
            }
        }

        info!("dispatch loop finished");
    })
}
