// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared path builders for log files.
//!
//! Used by both the logger (writer) and the CLI (reader) to construct
//! consistent paths in the directory structure:
//!   `<logs_dir>/task/<task_id>.log`

use std::path::{Path, PathBuf};

/// Build the path to a task activity log file.
///
/// Structure: `{logs_dir}/task/{task_id}.log`
pub fn task_log_path(logs_dir: &Path, task_id: &str) -> PathBuf {
    logs_dir.join("task").join(format!("{}.log", task_id))
}

/// Build the path to the execution history file.
///
/// Structure: `{logs_dir}/executions.jsonl`
pub fn execution_log_path(logs_dir: &Path) -> PathBuf {
    logs_dir.join("executions.jsonl")
}

#[cfg(test)]
#[path = "log_paths_tests.rs"]
mod tests;
