// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSONL log of finished executions.
//!
//! Each record is a single line of JSON. Lines that fail to parse are
//! skipped with a warning when reading, so a torn final write never hides
//! the rest of the history.

use crate::StorageError;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rota_core::ExecutionRecord;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Destination for execution records
pub trait RecordSink: Send + Sync {
    fn persist(&self, record: &ExecutionRecord) -> Result<(), StorageError>;
}

/// Append-only execution history on disk
#[derive(Debug)]
pub struct ExecutionLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ExecutionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &ExecutionRecord) -> Result<(), StorageError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock();
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&line)?;
        file.flush()?;
        Ok(())
    }

    /// Every readable record, in the order written.
    pub fn all(&self) -> Result<Vec<ExecutionRecord>, StorageError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    path = %self.path.display(),
                    line = idx + 1,
                    error = %e,
                    "skipping unreadable execution record",
                ),
            }
        }
        Ok(records)
    }

    /// Records whose start falls in `[start, end)`, ordered by start time.
    pub fn records_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ExecutionRecord>, StorageError> {
        let mut records: Vec<_> = self
            .all()?
            .into_iter()
            .filter(|r| r.started_at >= start && r.started_at < end)
            .collect();
        records.sort_by_key(|r| r.started_at);
        Ok(records)
    }
}

impl RecordSink for ExecutionLog {
    fn persist(&self, record: &ExecutionRecord) -> Result<(), StorageError> {
        self.append(record)
    }
}

#[cfg(test)]
#[path = "execution_log_tests.rs"]
mod tests;
