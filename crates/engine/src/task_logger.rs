// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only logger for per-task activity logs.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rota_core::TaskId;

use crate::log_paths;

/// Append-only logger for per-task activity logs.
///
/// Writes human-readable timestamped lines to:
///   `<log_dir>/task/<task_id>.log`
///
/// Each `append()` call opens, writes, and closes the file.
/// This is safe for the low write frequency of task events.
#[derive(Debug, Clone)]
pub struct TaskLogger {
    log_dir: PathBuf,
}

impl TaskLogger {
    pub fn new(log_dir: PathBuf) -> Self {
        Self { log_dir }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Append a timestamped log line to the task's log file.
    ///
    /// Format: `2026-01-30T08:14:09Z [task] message`
    ///
    /// Failures are logged via tracing and otherwise ignored.
    pub fn append(&self, task_id: &TaskId, message: &str) {
        let path = log_paths::task_log_path(&self.log_dir, task_id.as_str());
        if let Err(e) = self.write_line(&path, message) {
            tracing::warn!(
                task_id = %task_id,
                error = %e,
                "failed to write task log"
            );
        }
    }

    fn write_line(&self, path: &Path, message: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let ts = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
        writeln!(file, "{} [task] {}", ts, message)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "task_logger_tests.rs"]
mod tests;
