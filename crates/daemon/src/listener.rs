// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for the control socket.
//!
//! Accepts connections and handles each in its own task so a client
//! following a long execution never holds up the scheduler or other
//! clients. Manual runs go onto the scheduler's own queue.

use std::path::Path;

use chrono::{DateTime, Utc};
use rota_adapters::Launcher;
use rota_core::{Calendar, Clock, Event, TaskId};
use rota_engine::{CancelOutcome, Scheduler};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::UnixListener;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::protocol::{self, Request, Response, DEFAULT_TIMEOUT};

/// Listener task for accepting socket connections.
pub struct Listener<L, C, K> {
    socket: UnixListener,
    scheduler: Scheduler<L, C, K>,
    events: broadcast::Sender<Event>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),
}

impl<L, C, K> Listener<L, C, K>
where
    L: Launcher,
    C: Clock,
    K: Calendar,
{
    /// Bind the control socket, replacing a stale one left by a crash.
    ///
    /// Only call this while holding the instance lock.
    pub fn bind(
        path: &Path,
        scheduler: Scheduler<L, C, K>,
        events: broadcast::Sender<Event>,
    ) -> std::io::Result<Self> {
        match std::fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "removed stale socket"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        let socket = UnixListener::bind(path)?;
        Ok(Self {
            socket,
            scheduler,
            events,
        })
    }

    /// Accept connections until `shutdown` fires.
    pub async fn run(self, shutdown: CancellationToken) {
        loop {
            let accepted = tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = self.socket.accept() => accepted,
            };
            match accepted {
                Ok((stream, _)) => {
                    // Subscribe before the request is read so no event of a
                    // manual run can slip past
                    let events = self.events.subscribe();
                    let scheduler = self.scheduler.clone();
                    tokio::spawn(async move {
                        let (reader, writer) = stream.into_split();
                        if let Err(e) = handle_connection(reader, writer, scheduler, events).await
                        {
                            match e {
                                ConnectionError::Protocol(
                                    protocol::ProtocolError::ConnectionClosed,
                                ) => debug!("Client disconnected"),
                                ConnectionError::Protocol(protocol::ProtocolError::Timeout) => {
                                    warn!("Connection timeout")
                                }
                                _ => error!("Connection error: {}", e),
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
        debug!("listener stopped");
    }
}

/// Handle a single client connection.
///
/// `events` must have been subscribed before the request arrived.
pub async fn handle_connection<R, W, L, C, K>(
    mut reader: R,
    mut writer: W,
    scheduler: Scheduler<L, C, K>,
    events: broadcast::Receiver<Event>,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    L: Launcher,
    C: Clock,
    K: Calendar,
{
    let request = protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await?;
    info!(request = ?request, "received request");

    match request {
        Request::Cancel => {
            let response = match scheduler.cancel_current().await {
                CancelOutcome::Cancelled { task_id } => Response::Cancelled { task_id },
                CancelOutcome::Rejected { task_id, reason } => {
                    Response::CancelRejected { task_id, reason }
                }
                CancelOutcome::Idle => Response::Idle,
            };
            protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await?;
        }
        Request::RunNow { task_id } => {
            follow_run(&mut writer, scheduler, events, task_id).await?;
        }
    }
    Ok(())
}

/// Queue `task_id` and stream its events until the execution ends.
async fn follow_run<W, L, C, K>(
    writer: &mut W,
    scheduler: Scheduler<L, C, K>,
    mut events: broadcast::Receiver<Event>,
    task_id: TaskId,
) -> Result<(), ConnectionError>
where
    W: AsyncWrite + Unpin,
    L: Launcher,
    C: Clock,
    K: Calendar,
{
    let requested_at = scheduler.now();
    let ahead = scheduler
        .pending()
        .iter()
        .filter(|item| item.task_id == task_id)
        .count();

    let accepted = match scheduler.run_now(&task_id).await {
        Ok(accepted) => accepted,
        Err(e) => {
            let response = Response::Error {
                message: e.to_string(),
            };
            protocol::write_response(writer, &response, DEFAULT_TIMEOUT).await?;
            return Ok(());
        }
    };
    // Holding the scheduler would keep the event stream open past shutdown
    drop(scheduler);

    protocol::write_response(writer, &Response::Queued { accepted }, DEFAULT_TIMEOUT).await?;
    if !accepted {
        return Ok(());
    }

    let mut follow = RunFollow::new(task_id, requested_at, ahead);
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!(task_id = %follow.task_id, skipped, "run follower lagged behind events");
                continue;
            }
            Err(RecvError::Closed) => {
                debug!(task_id = %follow.task_id, "event stream closed before run ended");
                return Ok(());
            }
        };
        let Some(event) = follow.accept(event) else {
            continue;
        };
        let done = protocol::ends_run(&event);
        protocol::write_response(writer, &Response::Event { event }, DEFAULT_TIMEOUT).await?;
        if done {
            return Ok(());
        }
    }
}

/// Picks one execution's events out of the shared stream.
///
/// Earlier executions of the same task may still be running or queued
/// when the request arrives. Those are skipped: a run that started before
/// the request, plus `ahead` queued runs that end before ours begins.
#[derive(Debug)]
pub(crate) struct RunFollow {
    task_id: TaskId,
    requested_at: DateTime<Utc>,
    ahead: usize,
    phase: Phase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Waiting,
    Skipping,
    Following,
}

impl RunFollow {
    pub(crate) fn new(task_id: TaskId, requested_at: DateTime<Utc>, ahead: usize) -> Self {
        Self {
            task_id,
            requested_at,
            ahead,
            phase: Phase::Waiting,
        }
    }

    /// Returns the event if it belongs to the followed execution.
    pub(crate) fn accept(&mut self, event: Event) -> Option<Event> {
        if event.task_id() != &self.task_id {
            return None;
        }
        match (self.phase, &event) {
            (Phase::Following, _) => Some(event),
            (Phase::Waiting, Event::ExecutionStarted { started_at, .. }) => {
                if *started_at < self.requested_at {
                    None
                } else if self.ahead > 0 {
                    self.ahead -= 1;
                    self.phase = Phase::Skipping;
                    None
                } else {
                    self.phase = Phase::Following;
                    Some(event)
                }
            }
            (Phase::Waiting, Event::TaskUnsupported { .. }) => {
                if self.ahead > 0 {
                    self.ahead -= 1;
                    None
                } else {
                    Some(event)
                }
            }
            (Phase::Skipping, Event::ExecutionFinished { .. }) => {
                self.phase = Phase::Waiting;
                None
            }
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
