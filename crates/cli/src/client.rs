// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands

use std::path::PathBuf;
use std::time::{Duration, Instant};

use rota_core::{Event, TaskId};
use rota_daemon::protocol::{self, ProtocolError};
use rota_daemon::{Request, Response};
use thiserror::Error;
use tokio::net::unix::OwnedReadHalf;
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

// Timeout configuration (env vars in milliseconds)
fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for a single request or response
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("ROTA_TIMEOUT_IPC_MS").unwrap_or(protocol::DEFAULT_TIMEOUT)
}

/// How long to keep retrying while the daemon binds its socket
pub fn timeout_connect() -> Duration {
    parse_duration_ms("ROTA_TIMEOUT_CONNECT_MS").unwrap_or(Duration::from_secs(2))
}

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("rotad holds the instance lock but is not answering on {path}: {source}")]
    NotAnswering {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("{0}")]
    Rejected(String),

    #[error("Unexpected response from daemon")]
    UnexpectedResponse,
}

/// Daemon client
pub struct DaemonClient {
    socket_path: PathBuf,
    connect_timeout: Duration,
}

impl DaemonClient {
    pub fn new(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            connect_timeout: timeout_connect(),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Connect, retrying while a daemon that just took the lock binds its socket.
    async fn open(&self) -> Result<UnixStream, ClientError> {
        let start = Instant::now();
        loop {
            match UnixStream::connect(&self.socket_path).await {
                Ok(stream) => return Ok(stream),
                Err(source) if start.elapsed() >= self.connect_timeout => {
                    return Err(ClientError::NotAnswering {
                        path: self.socket_path.clone(),
                        source,
                    })
                }
                Err(_) => tokio::time::sleep(POLL_INTERVAL).await,
            }
        }
    }

    /// Ask the daemon to stop its current execution.
    pub async fn cancel(&self) -> Result<Response, ClientError> {
        let stream = self.open().await?;
        let (mut reader, mut writer) = stream.into_split();
        protocol::write_request(&mut writer, &Request::Cancel, timeout_ipc()).await?;
        match protocol::read_response(&mut reader, timeout_ipc()).await? {
            Response::Error { message } => Err(ClientError::Rejected(message)),
            response @ (Response::Cancelled { .. }
            | Response::CancelRejected { .. }
            | Response::Idle) => Ok(response),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Queue `task_id` on the daemon and follow the run.
    ///
    /// Returns `Ok(None)` when the daemon already has the task queued for
    /// this minute.
    pub async fn run_now(&self, task_id: &TaskId) -> Result<Option<RunStream>, ClientError> {
        let stream = self.open().await?;
        let (mut reader, mut writer) = stream.into_split();
        let request = Request::RunNow {
            task_id: task_id.clone(),
        };
        protocol::write_request(&mut writer, &request, timeout_ipc()).await?;
        match protocol::read_response(&mut reader, timeout_ipc()).await? {
            Response::Queued { accepted: true } => Ok(Some(RunStream::spawn(reader))),
            Response::Queued { accepted: false } => Ok(None),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }
}

/// Events of one run as the daemon streams them.
///
/// Reading happens in a background task, so [`RunStream::next`] can sit in
/// a `select!` without losing a partly read message.
pub struct RunStream {
    responses: mpsc::Receiver<Result<Response, ProtocolError>>,
    reader: JoinHandle<()>,
}

impl RunStream {
    fn spawn(mut reader: OwnedReadHalf) -> Self {
        let (tx, rx) = mpsc::channel(64);
        let reader = tokio::spawn(async move {
            loop {
                // No timeout: a run may stay quiet for as long as it likes
                let response = match protocol::read_message(&mut reader).await {
                    Ok(bytes) => protocol::decode::<Response>(&bytes),
                    Err(e) => Err(e),
                };
                let failed = response.is_err();
                if tx.send(response).await.is_err() || failed {
                    break;
                }
            }
        });
        Self {
            responses: rx,
            reader,
        }
    }

    /// Next event of the run; `Ok(None)` once the daemon closes the stream.
    pub async fn next(&mut self) -> Result<Option<Event>, ClientError> {
        match self.responses.recv().await {
            None | Some(Err(ProtocolError::ConnectionClosed)) => Ok(None),
            Some(Err(e)) => Err(e.into()),
            Some(Ok(Response::Event { event })) => Ok(Some(event)),
            Some(Ok(Response::Error { message })) => Err(ClientError::Rejected(message)),
            Some(Ok(_)) => Err(ClientError::UnexpectedResponse),
        }
    }
}

impl Drop for RunStream {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
