// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-lane FIFO run queue with per-minute duplicate suppression.
//!
//! An item's identity is its task id plus the minute it was offered in.
//! A second offer with the same identity is refused, both while the first
//! is still waiting and after it has been taken for execution, until an
//! offer for a later minute arrives.

use chrono::{DateTime, Utc};
use rota_core::{truncate_to_minute, QueueItem, TaskId};
use std::collections::{HashSet, VecDeque};

#[derive(Debug, Default)]
pub struct RunQueue {
    items: VecDeque<QueueItem>,
    /// Ids accepted during `current_minute`
    recent: HashSet<TaskId>,
    current_minute: Option<DateTime<Utc>>,
}

impl RunQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `task_id` unless an item with the same identity was already accepted.
    ///
    /// Returns `false` without touching the queue for a duplicate.
    pub fn offer(&mut self, task_id: TaskId, now: DateTime<Utc>) -> bool {
        let minute = truncate_to_minute(now);
        if !matches!(self.current_minute, Some(m) if m >= minute) {
            self.recent.clear();
            self.current_minute = Some(minute);
        }

        let pending = self
            .items
            .iter()
            .any(|item| item.task_id == task_id && item.minute() == minute);
        let seen = self.current_minute == Some(minute) && self.recent.contains(&task_id);
        if pending || seen {
            return false;
        }

        if self.current_minute == Some(minute) {
            self.recent.insert(task_id.clone());
        }
        self.items.push_back(QueueItem::new(task_id, now));
        true
    }

    /// Take the oldest item.
    pub fn pop(&mut self) -> Option<QueueItem> {
        self.items.pop_front()
    }

    /// Lazily take items in FIFO order; stopping early leaves the rest queued.
    pub fn drain(&mut self) -> Drain<'_> {
        Drain { queue: self }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Copy of the pending items, oldest first
    pub fn snapshot(&self) -> Vec<QueueItem> {
        self.items.iter().cloned().collect()
    }
}

/// Iterator returned by [`RunQueue::drain`]
pub struct Drain<'a> {
    queue: &'a mut RunQueue,
}

impl Iterator for Drain<'_> {
    type Item = QueueItem;

    fn next(&mut self) -> Option<QueueItem> {
        self.queue.pop()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
