// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::schedule::{Field, FieldKind};

#[test]
fn builder_sets_fields() {
    let task = TaskDefinition::new("t1", "Nightly report", r"C:\jobs\report.py")
        .tool(Tool::Robot)
        .schedule(ScheduleRule::daily_at(7, 0))
        .enabled(false);

    assert_eq!(task.id, "t1");
    assert_eq!(task.tool, Tool::Robot);
    assert_eq!(task.schedule.hours, Field::values([7]));
    assert!(!task.enabled);
}

#[test]
fn deserializes_with_defaults() {
    let task: TaskDefinition = serde_json::from_str(
        r#"{"id": "t2", "name": "Backup", "target": "/opt/backup.exe"}"#,
    )
    .unwrap();

    assert_eq!(task.tool, Tool::Auto);
    assert!(task.enabled);
    assert_eq!(task.schedule, ScheduleRule::any());
}

#[test]
fn serializes_schedule_as_text() {
    let task = TaskDefinition::new("t3", "Sync", "sync.bat")
        .schedule(ScheduleRule::any().with(FieldKind::Weekday, Field::values([1, 2])));
    let json = serde_json::to_value(&task).unwrap();

    assert_eq!(json["id"], "t3");
    assert_eq!(json["tool"], "auto");
    assert_eq!(json["schedule"]["weekdays"], "1,2");
}

#[test]
fn task_id_short_truncates_on_char_boundary() {
    let id = TaskId::new("ação-12345");
    assert_eq!(id.short(3), "açã");
    assert_eq!(id.short(50), "ação-12345");
}

#[test]
fn sort_key_folds_case() {
    let task = TaskDefinition::new("t4", "Zeta Report", "z.exe");
    assert_eq!(task.sort_key(), "zeta report");
}
