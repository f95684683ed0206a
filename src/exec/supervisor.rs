// src/exec/supervisor.rs

//! Single-process supervision: spawn a child, drain both of its output
//! streams concurrently, and report the exit code only once everything has
//! completed.
//!
//! The three sub-tasks (stdout drain, stderr drain, process wait) are live
//! simultaneously. Running them sequentially would reintroduce two known
//! failure modes:
//! - buffered output lost when the child exits before its pipes are read,
//! - deadlock when the child blocks writing to a full pipe nobody drains.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::errors::{Result, StagehandError};
use crate::exec::invocation::Invocation;
use crate::exec::sink::{StreamSink, StreamSource};

/// Result of a completed invocation.
///
/// Only constructed after both stream drains and the process wait have all
/// finished, so the drain flags are true by construction; they exist to make
/// that invariant visible at the type level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    /// Child exit code; `-1` when the child was terminated by a signal.
    pub code: i32,
    pub stdout_drained: bool,
    pub stderr_drained: bool,
}

impl ExitOutcome {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Trait abstracting how a single invocation is executed.
///
/// Production code uses [`ProcessSupervisor`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait ProcessBackend: Send + Sync {
    /// Launch the invocation, stream its output into `sink`, and resolve
    /// with the exit outcome once the process and both drains are done.
    ///
    /// A non-zero exit code is **not** an error at this layer; only a failed
    /// launch (or cancellation) is.
    fn invoke<'a>(
        &'a self,
        invocation: Invocation,
        sink: Arc<dyn StreamSink>,
    ) -> Pin<Box<dyn Future<Output = Result<ExitOutcome>> + Send + 'a>>;
}

/// Real process backend used in production.
#[derive(Debug, Default)]
pub struct ProcessSupervisor;

impl ProcessSupervisor {
    pub fn new() -> Self {
        Self
    }

    /// Run one invocation to completion without external cancellation.
    pub async fn run(
        &self,
        invocation: &Invocation,
        sink: Arc<dyn StreamSink>,
    ) -> Result<ExitOutcome> {
        self.run_inner(invocation, sink, None).await
    }

    /// Run one invocation, killing the child if `cancel_rx` fires first.
    ///
    /// On cancellation the child is signalled, its exit is reaped, and both
    /// drains still run to end-of-stream before `Cancelled` is returned
    /// (no orphaned process, no leaked pipe handles).
    pub async fn run_with_cancel(
        &self,
        invocation: &Invocation,
        sink: Arc<dyn StreamSink>,
        cancel_rx: oneshot::Receiver<()>,
    ) -> Result<ExitOutcome> {
        self.run_inner(invocation, sink, Some(cancel_rx)).await
    }

    async fn run_inner(
        &self,
        invocation: &Invocation,
        sink: Arc<dyn StreamSink>,
        cancel_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<ExitOutcome> {
        debug!(command = %invocation, "spawning child process");

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .envs(&invocation.env)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(cwd) = &invocation.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(|err| StagehandError::Launch {
            command: invocation.command_line(),
            source: err,
        })?;

        // The pipes are always present: both streams were requested above.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let stdout_task = tokio::spawn(drain_stream(stdout, StreamSource::Stdout, sink.clone()));
        let stderr_task = tokio::spawn(drain_stream(stderr, StreamSource::Stderr, sink.clone()));

        // Await the child's exit, watching for cancellation if requested.
        let mut cancelled = false;
        let status = match cancel_rx {
            None => child.wait().await?,
            Some(mut cancel_rx) => {
                tokio::select! {
                    status = child.wait() => status?,
                    cancel = &mut cancel_rx => {
                        if cancel.is_ok() {
                            debug!(command = %invocation, "cancellation requested; killing child");
                            cancelled = true;
                            if let Err(err) = child.start_kill() {
                                warn!(command = %invocation, error = %err,
                                    "failed to signal child on cancellation");
                            }
                        }
                        // Cancel channel dropped without firing also lands
                        // here; either way the exit must still be reaped.
                        child.wait().await?
                    }
                }
            }
        };

        // Join barrier: the outcome is not visible until both drains have
        // observed end-of-stream. Killing the child (above) closes its pipe
        // ends, so this terminates promptly on the cancel path too.
        stdout_task.await.map_err(anyhow::Error::from)?;
        stderr_task.await.map_err(anyhow::Error::from)?;

        if cancelled {
            return Err(StagehandError::Cancelled {
                command: invocation.command_line(),
            });
        }

        let code = status.code().unwrap_or(-1);
        debug!(command = %invocation, exit_code = code, "child process exited");

        Ok(ExitOutcome {
            code,
            stdout_drained: true,
            stderr_drained: true,
        })
    }
}

impl ProcessBackend for ProcessSupervisor {
    fn invoke<'a>(
        &'a self,
        invocation: Invocation,
        sink: Arc<dyn StreamSink>,
    ) -> Pin<Box<dyn Future<Output = Result<ExitOutcome>> + Send + 'a>> {
        Box::pin(async move { self.run(&invocation, sink).await })
    }
}

/// Read one child stream to end-of-stream, forwarding complete lines to the
/// sink as they arrive.
///
/// Bytes are decoded lossily: a malformed sequence becomes replacement
/// characters rather than aborting the drain, since losing log visibility is
/// worse than a decoding glitch.
async fn drain_stream<R>(stream: Option<R>, source: StreamSource, sink: Arc<dyn StreamSink>)
where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return;
    };

    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                while matches!(buf.last(), Some(b'\n' | b'\r')) {
                    buf.pop();
                }
                let line = String::from_utf8_lossy(&buf);
                sink.write_line(source, &line);
            }
            Err(err) => {
                warn!(%source, error = %err, "error reading child stream");
                break;
            }
        }
    }
}
