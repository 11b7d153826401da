// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscriber that writes scheduler events to the daemon log and fans
//! them out to connected clients.

use rota_core::Event;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::Level;

/// Consume events until every sender is dropped.
///
/// Each event is logged, then offered to `fanout`. Having no subscribers
/// is normal.
pub fn spawn_event_logger(
    mut events: mpsc::Receiver<Event>,
    fanout: broadcast::Sender<Event>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log_event(&event);
            let _ = fanout.send(event);
        }
        tracing::debug!("event stream closed");
    })
}

/// Log level an event is written at
pub fn level(event: &Event) -> Level {
    match event {
        Event::ExecutionOutput { .. } => Level::DEBUG,
        Event::TaskUnsupported { .. } | Event::CancelRejected { .. } => Level::WARN,
        Event::ExecutionFinished { exit_status, .. } if !exit_status.is_success() => Level::WARN,
        _ => Level::INFO,
    }
}

fn log_event(event: &Event) {
    let summary = event.log_summary();
    match (level(event), event) {
        (_, Event::ExecutionOutput { text, .. }) => {
            tracing::debug!(event = %summary, %text, "output")
        }
        (Level::WARN, _) => tracing::warn!(event = %summary, "event"),
        _ => tracing::info!(event = %summary, "event"),
    }
}

#[cfg(test)]
#[path = "event_log_tests.rs"]
mod tests;
