// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task catalog persistence.
//!
//! The catalog is a single JSON document, `{"tasks": [...]}`. Every read
//! goes to disk so that edits made by the CLI are picked up by a running
//! daemon on its next tick. Writes replace the file atomically (write to
//! `.tmp`, then rename).
//!
//! Entries are decoded one by one. An entry that no longer decodes (a
//! hand-edited rule, say) is skipped with a warning and written back
//! untouched, so the remaining tasks keep running.

use crate::StorageError;
use rota_core::{TaskDefinition, TaskId};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Read access to registered tasks
pub trait TaskCatalog: Send + Sync {
    /// Every task with `enabled == true`
    fn enabled_tasks(&self) -> Result<Vec<TaskDefinition>, StorageError>;

    fn get(&self, id: &TaskId) -> Result<Option<TaskDefinition>, StorageError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    tasks: Vec<serde_json::Value>,
}

/// Decoded catalog plus the entries that failed to decode
#[derive(Debug, Default)]
struct Entries {
    tasks: Vec<TaskDefinition>,
    unreadable: Vec<serde_json::Value>,
}

impl Entries {
    fn contains(&self, id: &TaskId) -> bool {
        self.tasks.iter().any(|t| &t.id == id)
            || self
                .unreadable
                .iter()
                .any(|raw| raw_id(raw) == Some(id.as_str()))
    }
}

fn raw_id(raw: &serde_json::Value) -> Option<&str> {
    raw.get("id").and_then(|v| v.as_str())
}

/// File-backed task catalog
#[derive(Debug, Clone)]
pub struct CatalogFile {
    path: PathBuf,
}

impl CatalogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All tasks, sorted by case-folded name.
    pub fn list(&self) -> Result<Vec<TaskDefinition>, StorageError> {
        let mut tasks = self.load()?.tasks;
        tasks.sort_by_cached_key(|t| (t.sort_key(), t.id.clone()));
        Ok(tasks)
    }

    /// Register a new task; fails if the id is taken.
    pub fn add(&self, task: TaskDefinition) -> Result<(), StorageError> {
        let mut entries = self.load()?;
        if entries.contains(&task.id) {
            return Err(StorageError::Duplicate(task.id));
        }
        tracing::info!(task_id = %task.id, name = %task.name, "task added");
        entries.tasks.push(task);
        self.save(&entries)
    }

    /// Replace an existing task definition.
    pub fn update(&self, task: TaskDefinition) -> Result<(), StorageError> {
        let mut entries = self.load()?;
        let slot = entries
            .tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or_else(|| StorageError::NotFound(task.id.clone()))?;
        tracing::info!(task_id = %task.id, "task updated");
        *slot = task;
        self.save(&entries)
    }

    /// Remove a task, returning its last definition.
    pub fn remove(&self, id: &TaskId) -> Result<TaskDefinition, StorageError> {
        let mut entries = self.load()?;
        let idx = entries
            .tasks
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| StorageError::NotFound(id.clone()))?;
        let task = entries.tasks.remove(idx);
        self.save(&entries)?;
        tracing::info!(task_id = %id, "task removed");
        Ok(task)
    }

    /// Enable or disable a task.
    pub fn set_enabled(&self, id: &TaskId, enabled: bool) -> Result<(), StorageError> {
        let mut entries = self.load()?;
        let task = entries
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| StorageError::NotFound(id.clone()))?;
        task.enabled = enabled;
        tracing::info!(task_id = %id, enabled, "task toggled");
        self.save(&entries)
    }

    /// Missing file reads as an empty catalog.
    fn load(&self) -> Result<Entries, StorageError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Entries::default()),
            Err(e) => return Err(e.into()),
        };
        let doc: CatalogDocument =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| {
                StorageError::Corrupt {
                    path: self.path.clone(),
                    source,
                }
            })?;

        let mut entries = Entries::default();
        for (idx, raw) in doc.tasks.into_iter().enumerate() {
            match TaskDefinition::deserialize(&raw) {
                Ok(task) => entries.tasks.push(task),
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        entry = idx,
                        task_id = raw_id(&raw).unwrap_or("?"),
                        error = %e,
                        "skipping unreadable task"
                    );
                    entries.unreadable.push(raw);
                }
            }
        }
        Ok(entries)
    }

    fn save(&self, entries: &Entries) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut tasks = entries
            .tasks
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        tasks.extend(entries.unreadable.iter().cloned());
        let doc = CatalogDocument { tasks };

        let tmp_path = self.path.with_extension("tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &doc)?;
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl TaskCatalog for CatalogFile {
    fn enabled_tasks(&self) -> Result<Vec<TaskDefinition>, StorageError> {
        Ok(self
            .load()?
            .tasks
            .into_iter()
            .filter(|t| t.enabled)
            .collect())
    }

    fn get(&self, id: &TaskId) -> Result<Option<TaskDefinition>, StorageError> {
        Ok(self.load()?.tasks.into_iter().find(|t| &t.id == id))
    }
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
