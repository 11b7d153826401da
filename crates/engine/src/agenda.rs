// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Day agenda: which tasks fire when on a given date

use crate::matcher::matches;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rota_core::{ActiveWindow, Calendar, TaskDefinition, TaskId};
use serde::Serialize;

/// One planned firing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgendaEntry {
    pub at: DateTime<Utc>,
    /// Local wall-clock time
    pub time: NaiveTime,
    pub task_id: TaskId,
    pub task_name: String,
}

/// Every minute of `window` on `date` at which an enabled task fires.
///
/// Sorted by time, then by case-folded task name. Local times skipped by a
/// DST transition are left out.
pub fn agenda(
    tasks: &[TaskDefinition],
    date: NaiveDate,
    calendar: &impl Calendar,
    window: &ActiveWindow,
) -> Vec<AgendaEntry> {
    let candidates: Vec<&TaskDefinition> = tasks
        .iter()
        .filter(|t| t.enabled && t.schedule.empty_fields().is_empty())
        .collect();
    if candidates.is_empty() {
        return Vec::new();
    }

    let mut entries = Vec::new();
    for time in window.minutes() {
        let Some(at) = calendar.resolve(date, time) else {
            continue;
        };
        let fields = calendar.fields(at);
        for task in candidates.iter().filter(|t| matches(&t.schedule, &fields)) {
            entries.push(AgendaEntry {
                at,
                time,
                task_id: task.id.clone(),
                task_name: task.name.clone(),
            });
        }
    }

    entries.sort_by(|a, b| {
        a.time
            .cmp(&b.time)
            .then_with(|| a.task_name.to_lowercase().cmp(&b.task_name.to_lowercase()))
            .then_with(|| a.task_id.cmp(&b.task_id))
    });
    entries
}

#[cfg(test)]
#[path = "agenda_tests.rs"]
mod tests;
