// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn tasks() -> Vec<TaskDefinition> {
    vec![
        TaskDefinition::new("abc123", "Backup", "C:\\jobs\\backup.exe"),
        TaskDefinition::new("abd456", "Report", "C:\\jobs\\report.bat"),
        TaskDefinition::new("abc", "Short", "C:\\jobs\\short.exe"),
    ]
}

#[test]
fn exact_match_wins_over_prefix() {
    let task = resolve_task(&tasks(), "abc").unwrap();
    assert_eq!(task.name, "Short");
}

#[test]
fn unique_prefix_resolves() {
    let task = resolve_task(&tasks(), "abd").unwrap();
    assert_eq!(task.id, "abd456");
}

#[test]
fn ambiguous_prefix_lists_candidates() {
    let err = resolve_task(&tasks(), "ab").unwrap_err().to_string();
    assert!(err.contains("matches 3 tasks"), "{err}");
    assert!(err.contains("Backup"));
    assert!(err.contains("Report"));
}

#[yare::parameterized(
    unknown = { "zzz" },
    blank   = { "  " },
)]
fn unresolvable_query_is_an_error(query: &str) {
    assert!(resolve_task(&tasks(), query).is_err());
}
