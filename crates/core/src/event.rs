// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event types published by the scheduler

use crate::execution::{ExitStatus, OutputStream};
use crate::task::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notifications emitted while tasks are queued and executed.
///
/// Serializes with `{"type": "event:name", ...fields}` format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // -- task --
    /// A due (or manually triggered) task was accepted into the run queue
    #[serde(rename = "task:enqueued")]
    TaskEnqueued {
        task_id: TaskId,
        minute: DateTime<Utc>,
    },

    /// The task's target maps to no known launch mechanism
    #[serde(rename = "task:unsupported")]
    TaskUnsupported { task_id: TaskId, reason: String },

    // -- execution --
    #[serde(rename = "execution:started")]
    ExecutionStarted {
        task_id: TaskId,
        started_at: DateTime<Utc>,
    },

    #[serde(rename = "execution:output")]
    ExecutionOutput {
        task_id: TaskId,
        stream: OutputStream,
        text: String,
    },

    #[serde(rename = "execution:finished")]
    ExecutionFinished {
        task_id: TaskId,
        finished_at: DateTime<Utc>,
        exit_status: ExitStatus,
    },

    #[serde(rename = "execution:cancelled")]
    ExecutionCancelled { task_id: TaskId },

    /// Cancellation was requested for a launch that cannot be interrupted
    #[serde(rename = "execution:cancel_rejected")]
    CancelRejected { task_id: TaskId, reason: String },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::TaskEnqueued { .. } => "task:enqueued",
            Event::TaskUnsupported { .. } => "task:unsupported",
            Event::ExecutionStarted { .. } => "execution:started",
            Event::ExecutionOutput { .. } => "execution:output",
            Event::ExecutionFinished { .. } => "execution:finished",
            Event::ExecutionCancelled { .. } => "execution:cancelled",
            Event::CancelRejected { .. } => "execution:cancel_rejected",
        }
    }

    pub fn task_id(&self) -> &TaskId {
        match self {
            Event::TaskEnqueued { task_id, .. }
            | Event::TaskUnsupported { task_id, .. }
            | Event::ExecutionStarted { task_id, .. }
            | Event::ExecutionOutput { task_id, .. }
            | Event::ExecutionFinished { task_id, .. }
            | Event::ExecutionCancelled { task_id }
            | Event::CancelRejected { task_id, .. } => task_id,
        }
    }

    /// One-line summary for logs
    pub fn log_summary(&self) -> String {
        let t = self.name();
        match self {
            Event::TaskEnqueued { task_id, minute } => {
                format!("{t} task={task_id} minute={}", minute.format("%H:%M"))
            }
            Event::TaskUnsupported { task_id, reason } => {
                format!("{t} task={task_id} reason={reason}")
            }
            Event::ExecutionStarted { task_id, .. } => format!("{t} task={task_id}"),
            Event::ExecutionOutput {
                task_id, stream, ..
            } => format!("{t} task={task_id} stream={stream}"),
            Event::ExecutionFinished {
                task_id,
                exit_status,
                ..
            } => format!("{t} task={task_id} status={exit_status}"),
            Event::ExecutionCancelled { task_id } => format!("{t} task={task_id}"),
            Event::CancelRejected { task_id, reason } => {
                format!("{t} task={task_id} reason={reason}")
            }
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
