// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{ScheduleRule, TaskDefinition, TaskId};
use chrono::{DateTime, TimeZone, Utc};

/// UTC instant from calendar parts; panics on invalid input.
#[allow(clippy::panic)]
pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(year, month, day, hour, minute, second) {
        chrono::LocalResult::Single(at) => at,
        _ => panic!("invalid test instant {year}-{month}-{day} {hour}:{minute}:{second}"),
    }
}

/// Enabled task firing every day at `hour:minute`
pub fn daily_task(id: &str, name: &str, target: &str, hour: u32, minute: u32) -> TaskDefinition {
    TaskDefinition::new(id, name, target).schedule(ScheduleRule::daily_at(hour, minute))
}

/// Enabled task whose rule matches every minute
pub fn every_minute_task(id: &str, target: &str) -> TaskDefinition {
    TaskDefinition::new(id, id, target)
}

pub fn task_id(id: &str) -> TaskId {
    TaskId::new(id)
}
