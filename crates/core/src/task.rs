// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registered task definitions

use crate::id::ShortId;
use crate::schedule::ScheduleRule;
use serde::{Deserialize, Serialize};

/// Catalog identifier of a registered task
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a string slice truncated to at most `n` characters.
    pub fn short(&self, n: usize) -> &str {
        self.0.short(n)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for TaskId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TaskId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl std::borrow::Borrow<str> for TaskId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// How the target is launched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    /// Pick the mechanism from the target's file extension
    #[default]
    Auto,
    /// Target is the robot runner; the task name selects the process to execute
    Robot,
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tool::Auto => f.write_str("auto"),
            Tool::Robot => f.write_str("robot"),
        }
    }
}

/// A registered automation task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub id: TaskId,
    pub name: String,
    /// Entry path, optionally followed by arguments
    pub target: String,
    #[serde(default)]
    pub tool: Tool,
    #[serde(default)]
    pub schedule: ScheduleRule,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
}

fn enabled_default() -> bool {
    true
}

impl TaskDefinition {
    /// New enabled task with an always-matching schedule.
    pub fn new(id: impl Into<TaskId>, name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            target: target.into(),
            tool: Tool::Auto,
            schedule: ScheduleRule::any(),
            enabled: true,
        }
    }

    pub fn tool(mut self, tool: Tool) -> Self {
        self.tool = tool;
        self
    }

    pub fn schedule(mut self, schedule: ScheduleRule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Case-folded name, the catalog's sort key
    pub fn sort_key(&self) -> String {
        self.name.to_lowercase()
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
