//! Day agenda specs

use crate::prelude::*;

fn times(json: &serde_json::Value) -> Vec<String> {
    json.as_array()
        .unwrap()
        .iter()
        .map(|e| format!("{} {}", e["time"].as_str().unwrap(), e["task_name"].as_str().unwrap()))
        .collect()
}

#[test]
fn agenda_lists_firings_inside_the_window() {
    let ws = Workspace::new();
    ws.config("window = \"07:00-08:00\"\n");
    ws.rota()
        .args(&[
            "task", "add", "Report", "--target", "/jobs/report.exe", "--weekdays", "friday",
            "--minutes", "0,30",
        ])
        .passes();
    ws.rota()
        .args(&[
            "task", "add", "Backup", "--target", "/jobs/backup.exe", "--hours", "7",
            "--minutes", "15",
        ])
        .passes();

    // 2026-03-20 is a Friday
    let json = ws
        .rota()
        .args(&["agenda", "--date", "2026-03-20", "-o", "json"])
        .passes()
        .json();
    assert_eq!(
        times(&json),
        vec!["07:00:00 Report", "07:15:00 Backup", "07:30:00 Report"]
    );

    let json = ws
        .rota()
        .args(&["agenda", "--date", "2026-03-19", "-o", "json"])
        .passes()
        .json();
    assert_eq!(times(&json), vec!["07:15:00 Backup"]);
}

#[test]
fn disabled_tasks_are_left_out() {
    let ws = Workspace::new();
    ws.rota()
        .args(&[
            "task", "add", "Backup", "--target", "/jobs/backup.exe", "--hours", "9",
            "--minutes", "0", "--disabled",
        ])
        .passes();

    ws.rota()
        .args(&["agenda", "--date", "2026-03-20"])
        .passes()
        .stdout_has("(window 07:00-18:00)")
        .stdout_has("Nothing scheduled");
}

#[test]
fn agenda_table_shows_time_and_task() {
    let ws = Workspace::new();
    ws.rota()
        .args(&[
            "task", "add", "Backup", "--id", "backup01", "--target", "/jobs/backup.exe",
            "--hours", "9", "--minutes", "5",
        ])
        .passes();

    ws.rota()
        .args(&["agenda", "--date", "2026-03-20"])
        .passes()
        .stdout_eq(
            "\
Fri 2026-03-20 (window 07:00-18:00)
TIME   TASK    ID
09:05  Backup  backup01
",
        );
}
