// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory catalog and record sink for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::{RecordSink, StorageError, TaskCatalog};
use parking_lot::Mutex;
use rota_core::{ExecutionRecord, TaskDefinition, TaskId};
use std::sync::Arc;

#[derive(Default)]
struct MemoryCatalogState {
    tasks: Vec<TaskDefinition>,
    fail_reads: bool,
    reads: usize,
}

/// Catalog held in memory; clones share the same tasks
#[derive(Clone, Default)]
pub struct MemoryCatalog {
    inner: Arc<Mutex<MemoryCatalogState>>,
}

impl MemoryCatalog {
    pub fn new(tasks: impl IntoIterator<Item = TaskDefinition>) -> Self {
        let catalog = Self::default();
        catalog.inner.lock().tasks = tasks.into_iter().collect();
        catalog
    }

    pub fn insert(&self, task: TaskDefinition) {
        let mut state = self.inner.lock();
        state.tasks.retain(|t| t.id != task.id);
        state.tasks.push(task);
    }

    pub fn remove(&self, id: &TaskId) {
        self.inner.lock().tasks.retain(|t| &t.id != id);
    }

    /// Make every subsequent read fail until cleared
    pub fn set_failing(&self, failing: bool) {
        self.inner.lock().fail_reads = failing;
    }

    /// Number of read calls served or refused
    pub fn reads(&self) -> usize {
        self.inner.lock().reads
    }

    fn read<T>(&self, f: impl FnOnce(&[TaskDefinition]) -> T) -> Result<T, StorageError> {
        let mut state = self.inner.lock();
        state.reads += 1;
        if state.fail_reads {
            return Err(StorageError::Unavailable("catalog offline".to_string()));
        }
        Ok(f(&state.tasks))
    }
}

impl TaskCatalog for MemoryCatalog {
    fn enabled_tasks(&self) -> Result<Vec<TaskDefinition>, StorageError> {
        self.read(|tasks| tasks.iter().filter(|t| t.enabled).cloned().collect())
    }

    fn get(&self, id: &TaskId) -> Result<Option<TaskDefinition>, StorageError> {
        self.read(|tasks| tasks.iter().find(|t| &t.id == id).cloned())
    }
}

/// Sink that keeps records in memory
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<ExecutionRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ExecutionRecord> {
        self.records.lock().clone()
    }
}

impl RecordSink for MemorySink {
    fn persist(&self, record: &ExecutionRecord) -> Result<(), StorageError> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
