// src/exec/runner.rs

//! Single-command process runner.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::ExecutorConfig;
use crate::types::{FailureKind, OutputEvent, OutputHandler};

const READ_BUF_SIZE: usize = 8192;
const CHUNK_CHANNEL_CAPACITY: usize = 64;

/// How long to keep reading after the child has exited. The pipes may
/// never reach EOF when the command left a background child holding
/// them, so the post-exit drain ends after this quiet period instead of
/// waiting for EOF.
const EXIT_DRAIN_GRACE: Duration = Duration::from_millis(50);

/// Run one command to completion, delivering everything through
/// `handler`.
///
/// Never returns an error: launch failures, runtime failures and
/// timeouts are all mapped to [`OutputEvent::Failure`], so the dispatch
/// loop stays alive no matter how badly the command ends.
pub async fn run(command: &str, handler: &mut OutputHandler, config: &ExecutorConfig) {
    if let Err(err) = run_inner(command, handler, config).await {
        warn!(cmd = %command, error = %err, "command execution error");
        handler(OutputEvent::Failure {
            kind: FailureKind::Runtime,
            detail: err.to_string(),
        });
    }
}

/// Build the shell invocation for a command string.
///
/// The command is handed to the shell verbatim (`-c <command>`); this
/// engine never parses or tokenizes it. `PATH` is overridden to the
/// configured value while the rest of the environment is inherited.
fn shell_command(command: &str, config: &ExecutorConfig) -> Command {
    let mut cmd = match &config.shell {
        Some(shell) => {
            let mut c = Command::new(shell);
            c.arg("-c").arg(command);
            c
        }
        None if cfg!(windows) => {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(command);
            c
        }
        None => {
            let mut c = Command::new("sh");
            c.arg("-c").arg(command);
            c
        }
    };

    if let Some(path) = &config.path_env {
        cmd.env("PATH", path);
    }

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    cmd
}

async fn run_inner(
    command: &str,
    handler: &mut OutputHandler,
    config: &ExecutorConfig,
) -> Result<()> {
    info!(cmd = %command, "starting command process");

    let mut cmd = shell_command(command, config);
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            // Shell binary missing or not executable. Recovered locally;
            // the loop moves on to the next command.
            warn!(cmd = %command, error = %err, "failed to spawn shell");
            handler(OutputEvent::Failure {
                kind: FailureKind::Launch,
                detail: err.to_string(),
            });
            return Ok(());
        }
    };

    // Funnel both pipes through one channel so the handler observes a
    // single merged stream.
    let (chunk_tx, mut chunk_rx) = mpsc::channel::<String>(CHUNK_CHANNEL_CAPACITY);
    if let Some(stdout) = child.stdout.take() {
        spawn_chunk_reader(stdout, chunk_tx.clone(), "stdout");
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_chunk_reader(stderr, chunk_tx.clone(), "stderr");
    }
    drop(chunk_tx);

    let deadline = sleep(config.timeout);
    tokio::pin!(deadline);

    // Child exit is raced against the reads: a command that exits
    // while something else still holds its pipes open (e.g. a
    // backgrounded child) counts as terminated, not timed out.
    let mut pipes_open = true;
    loop {
        tokio::select! {
            maybe_chunk = chunk_rx.recv(), if pipes_open => match maybe_chunk {
                Some(chunk) => handler(OutputEvent::Chunk(chunk)),
                None => pipes_open = false,
            },
            status = child.wait() => {
                let status = status
                    .with_context(|| format!("waiting for process of '{command}'"))?;
                debug!(
                    cmd = %command,
                    exit_code = status.code().unwrap_or(-1),
                    success = status.success(),
                    "command process exited"
                );
                drain_remaining(&mut chunk_rx, handler).await;
                return Ok(());
            }
            _ = &mut deadline => {
                warn!(cmd = %command, timeout = ?config.timeout, "command exceeded its budget; killing");
                if let Err(err) = child.kill().await {
                    warn!(cmd = %command, error = %err, "failed to kill timed-out process");
                }
                handler(OutputEvent::Failure {
                    kind: FailureKind::Timeout,
                    detail: format!("{command} timed-out"),
                });
                return Ok(());
            }
        }
    }
}

/// Deliver whatever output is still in flight after the child exited.
async fn drain_remaining(chunk_rx: &mut mpsc::Receiver<String>, handler: &mut OutputHandler) {
    loop {
        match timeout(EXIT_DRAIN_GRACE, chunk_rx.recv()).await {
            Ok(Some(chunk)) => handler(OutputEvent::Chunk(chunk)),
            Ok(None) => break,
            Err(_elapsed) => {
                debug!("output pipes still open after exit; ending drain");
                break;
            }
        }
    }
}

/// Forward raw read-sized chunks from one pipe into the merge channel.
///
/// No line framing: a chunk is whatever one read returned. An
/// incomplete multi-byte UTF-8 sequence at the end of a read is
/// carried into the next one, so the concatenated chunks stay
/// lossless; truly invalid bytes decode to replacement characters.
/// The reader exits when the pipe hits EOF, the read fails, or the
/// runner has stopped receiving (timeout teardown).
fn spawn_chunk_reader<R>(pipe: R, tx: mpsc::Sender<String>, stream: &'static str)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut pipe = pipe;
        let mut buf = [0u8; READ_BUF_SIZE];
        let mut carry: Vec<u8> = Vec::new();

        loop {
            match pipe.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    carry.extend_from_slice(&buf[..n]);
                    let keep = incomplete_tail_len(&carry);
                    let ready = carry.len() - keep;
                    if ready > 0 {
                        let chunk = String::from_utf8_lossy(&carry[..ready]).into_owned();
                        carry.drain(..ready);
                        if tx.send(chunk).await.is_err() {
                            break;
                        }
                    }
                }
                Err(err) => {
                    debug!(stream, error = %err, "pipe read failed");
                    break;
                }
            }
        }

        // A tail that never completed is flushed as-is at EOF.
        if !carry.is_empty() {
            let _ = tx.send(String::from_utf8_lossy(&carry).into_owned()).await;
        }

        debug!(stream, "pipe reader finished");
    });
}

/// Length of an incomplete UTF-8 sequence at the end of `bytes`, if any.
///
/// Scans at most the last three bytes for a lead byte whose sequence
/// extends past the buffer. Stray continuation bytes with no lead are
/// not a tail; they decode lossily like any other invalid input.
fn incomplete_tail_len(bytes: &[u8]) -> usize {
    let start = bytes.len().saturating_sub(3);
    for i in (start..bytes.len()).rev() {
        let b = bytes[i];
        if b < 0x80 {
            return 0;
        }
        if b >= 0xC0 {
            let need = if b >= 0xF0 {
                4
            } else if b >= 0xE0 {
                3
            } else {
                2
            };
            let have = bytes.len() - i;
            return if have < need { have } else { 0 };
        }
        // Continuation byte; keep scanning back for the lead.
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn incomplete_tail_detection() {
        assert_eq!(incomplete_tail_len(b"hello"), 0);
        assert_eq!(incomplete_tail_len("héllo".as_bytes()), 0);

        let two_byte = "é".as_bytes();
        assert_eq!(incomplete_tail_len(&two_byte[..1]), 1);

        let four_byte = "🦀".as_bytes();
        assert_eq!(incomplete_tail_len(&four_byte[..2]), 2);
        assert_eq!(incomplete_tail_len(&four_byte[..3]), 3);
        assert_eq!(incomplete_tail_len(four_byte), 0);

        // Stray continuation bytes are not a tail.
        assert_eq!(incomplete_tail_len(&[0x80, 0x80]), 0);
    }

    #[tokio::test]
    async fn split_multibyte_sequence_stays_lossless() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let (tx, mut rx) = mpsc::channel(8);
        spawn_chunk_reader(reader, tx, "stdout");

        // Split a 4-byte scalar across two writes; the pause makes the
        // reader observe them as separate reads.
        let crab = "🦀".as_bytes();
        writer.write_all(&crab[..2]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        writer.write_all(&crab[2..]).await.unwrap();
        writer.write_all(b" ok\n").await.unwrap();
        drop(writer);

        let mut out = String::new();
        while let Some(chunk) = rx.recv().await {
            out.push_str(&chunk);
        }
        assert_eq!(out, "🦀 ok\n");
        assert!(!out.contains('\u{FFFD}'));
    }
}
