// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Launcher backed by real child processes
//!
//! On unix each child leads its own process group, so cancelling kills
//! everything it started. Output readers get a short grace period after
//! the child is gone; a pipe still held open by a survivor is abandoned.

use super::{LaunchError, Launcher};
use crate::decode::LineDecoder;
use async_trait::async_trait;
use rota_core::{ExitStatus, LaunchSpec, OutputLine, OutputStream};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const READ_CHUNK: usize = 4096;

/// How long output readers may run on after the child has exited
const READER_GRACE: Duration = Duration::from_secs(2);

/// Spawns each launch spec as a tokio child process
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLauncher;

impl ProcessLauncher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Launcher for ProcessLauncher {
    async fn launch(
        &self,
        spec: &LaunchSpec,
        output: mpsc::Sender<OutputLine>,
        cancel: CancellationToken,
    ) -> Result<ExitStatus, LaunchError> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);
        if let Some(dir) = &spec.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| LaunchError::Spawn {
            program: spec.program.clone(),
            source,
        })?;
        tracing::debug!(program = %spec.program, pid = ?child.id(), "process started");

        let readers: Vec<JoinHandle<()>> = [
            child
                .stdout
                .take()
                .map(|pipe| tokio::spawn(forward(pipe, OutputStream::Stdout, output.clone()))),
            child
                .stderr
                .take()
                .map(|pipe| tokio::spawn(forward(pipe, OutputStream::Stderr, output.clone()))),
        ]
        .into_iter()
        .flatten()
        .collect();
        drop(output);

        let waited = if spec.cancellable {
            tokio::select! {
                status = child.wait() => Some(status),
                _ = cancel.cancelled() => None,
            }
        } else {
            Some(child.wait().await)
        };

        let status = match waited {
            Some(Ok(status)) => ExitStatus::from_code(status.code()),
            Some(Err(source)) => {
                return Err(LaunchError::Wait {
                    program: spec.program.clone(),
                    source,
                })
            }
            None => {
                terminate(&mut child, &spec.program).await;
                ExitStatus::Terminated
            }
        };

        join_readers(readers).await;

        if !spec.settle.is_zero() {
            tracing::debug!(settle_ms = spec.settle.as_millis() as u64, "settling");
            tokio::time::sleep(spec.settle).await;
        }

        Ok(status)
    }
}

/// Kill the child and, on unix, the rest of its process group.
async fn terminate(child: &mut Child, program: &str) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        kill_group(pid).await;
    }
    if let Err(e) = child.kill().await {
        tracing::warn!(program, error = %e, "failed to kill process");
    }
}

#[cfg(unix)]
async fn kill_group(pgid: u32) {
    let status = Command::new("kill")
        .args(["-KILL", "--", &format!("-{pgid}")])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    match status {
        Ok(status) if status.success() => {}
        Ok(status) => tracing::debug!(pgid, ?status, "process group already gone"),
        Err(e) => tracing::warn!(pgid, error = %e, "failed to signal process group"),
    }
}

/// Wait for the pipe readers, abandoning any still blocked at the deadline.
async fn join_readers(readers: Vec<JoinHandle<()>>) {
    let deadline = tokio::time::Instant::now() + READER_GRACE;
    for reader in readers {
        let abort = reader.abort_handle();
        match tokio::time::timeout_at(deadline, reader).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "output reader task failed"),
            Err(_) => {
                abort.abort();
                tracing::warn!("output pipe held open after exit, abandoning reader");
            }
        }
    }
}

/// Read one pipe to EOF, sending each decoded line.
async fn forward<R>(mut pipe: R, stream: OutputStream, tx: mpsc::Sender<OutputLine>)
where
    R: AsyncRead + Unpin,
{
    let mut decoder = LineDecoder::new();
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let n = match pipe.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                tracing::debug!(%stream, error = %e, "pipe read failed");
                break;
            }
        };
        for text in decoder.push(&buf[..n]) {
            // Receiver gone means nobody is listening; keep draining the pipe
            let _ = tx.send(OutputLine { stream, text }).await;
        }
    }
    for text in decoder.finish() {
        let _ = tx.send(OutputLine { stream, text }).await;
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
