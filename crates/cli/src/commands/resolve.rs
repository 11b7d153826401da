// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task ID resolution for commands that take an ID argument.
//!
//! An exact ID wins; otherwise the query must be a prefix of exactly one ID.

use anyhow::{bail, Result};
use rota_core::TaskDefinition;

pub fn resolve_task(tasks: &[TaskDefinition], query: &str) -> Result<TaskDefinition> {
    let query = query.trim();
    if query.is_empty() {
        bail!("task ID must not be empty");
    }
    if let Some(task) = tasks.iter().find(|t| t.id == query) {
        return Ok(task.clone());
    }

    let matches: Vec<&TaskDefinition> = tasks
        .iter()
        .filter(|t| t.id.as_str().starts_with(query))
        .collect();
    match matches.as_slice() {
        [] => bail!("no task matching '{}'", query),
        [task] => Ok((*task).clone()),
        many => {
            let listed: Vec<String> = many
                .iter()
                .map(|t| format!("  {}  {}", t.id.short(12), t.name))
                .collect();
            bail!(
                "'{}' matches {} tasks; use a longer prefix:\n{}",
                query,
                many.len(),
                listed.join("\n")
            )
        }
    }
}

#[cfg(test)]
#[path = "resolve_tests.rs"]
mod tests;
