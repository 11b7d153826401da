// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the scheduler

use rota_core::TaskId;
use rota_storage::StorageError;
use thiserror::Error;

/// Errors returned to callers of the scheduler
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
