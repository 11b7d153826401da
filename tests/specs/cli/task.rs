//! Task catalog specs: add, list, show, edit, enable/disable, rm

use crate::prelude::*;
use std::path::Path;

#[test]
fn empty_catalog_lists_nothing() {
    let ws = Workspace::new();
    ws.rota()
        .args(&["task", "list"])
        .passes()
        .stdout_eq("No tasks registered\n");
    ws.rota()
        .args(&["task", "list", "-o", "json"])
        .passes()
        .stdout_eq("[]\n");
}

#[test]
fn add_then_list_as_table() {
    let ws = Workspace::new();
    ws.rota()
        .args(&[
            "task", "add", "Backup", "--id", "backup01", "--target", "/jobs/backup.exe",
            "--hours", "7", "--minutes", "0",
        ])
        .passes()
        .stdout_eq("Task 'Backup' added (backup01)\n");

    ws.rota().args(&["task", "list"]).passes().stdout_eq(
        "\
ID        NAME    TOOL  SCHEDULE       ENABLED  TARGET
backup01  Backup  auto  * * * * * 7 0  enabled  /jobs/backup.exe
",
    );
}

#[test]
fn list_is_sorted_by_case_folded_name() {
    let ws = Workspace::new();
    let target = Path::new("/jobs/x.exe");
    ws.add_task("zeta", target, &[]);
    ws.add_task("Alpha", target, &[]);
    ws.add_task("beta", target, &[]);

    let json = ws.rota().args(&["task", "list", "-o", "json"]).passes().json();
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Alpha", "beta", "zeta"]);
}

#[test]
fn json_task_carries_rule_text_fields() {
    let ws = Workspace::new();
    let json = ws
        .rota()
        .args(&[
            "task", "add", "Report", "--target", "/jobs/report.bat", "--weekdays",
            "monday,friday", "--hours", "8", "-o", "json",
        ])
        .passes()
        .json();

    assert_eq!(json["name"], "Report");
    assert_eq!(json["tool"], "auto");
    assert_eq!(json["enabled"], true);
    assert_eq!(json["schedule"]["weekdays"], "1,5");
    assert_eq!(json["schedule"]["hours"], "8");
    assert_eq!(json["schedule"]["minutes"], "*");
    assert_eq!(json["id"].as_str().unwrap().len(), 32);
}

#[test]
fn duplicate_id_is_rejected() {
    let ws = Workspace::new();
    ws.rota()
        .args(&["task", "add", "A", "--id", "same", "--target", "/jobs/a.exe"])
        .passes();
    ws.rota()
        .args(&["task", "add", "B", "--id", "same", "--target", "/jobs/b.exe"])
        .fails()
        .stderr_has("already exists");
}

#[test]
fn edit_by_prefix_changes_only_given_fields() {
    let ws = Workspace::new();
    ws.rota()
        .args(&[
            "task", "add", "Backup", "--id", "backup01", "--target", "/jobs/backup.exe",
            "--hours", "7", "--minutes", "0",
        ])
        .passes();

    ws.rota()
        .args(&["task", "edit", "back", "--minutes", "30", "--name", "Nightly backup"])
        .passes()
        .stdout_eq("Task 'Nightly backup' updated\n");

    let json = ws
        .rota()
        .args(&["task", "show", "backup01", "-o", "json"])
        .passes()
        .json();
    assert_eq!(json["name"], "Nightly backup");
    assert_eq!(json["target"], "/jobs/backup.exe");
    assert_eq!(json["schedule"]["hours"], "7");
    assert_eq!(json["schedule"]["minutes"], "30");
}

#[test]
fn disable_and_enable_toggle_the_flag() {
    let ws = Workspace::new();
    let id = ws.add_task("Backup", Path::new("/jobs/backup.exe"), &[]);

    ws.rota()
        .args(&["task", "disable", &id])
        .passes()
        .stdout_eq("Task 'Backup' disabled\n");
    let json = ws.rota().args(&["task", "show", &id, "-o", "json"]).passes().json();
    assert_eq!(json["enabled"], false);

    ws.rota()
        .args(&["task", "enable", &id])
        .passes()
        .stdout_eq("Task 'Backup' enabled\n");
    let json = ws.rota().args(&["task", "show", &id, "-o", "json"]).passes().json();
    assert_eq!(json["enabled"], true);
}

#[test]
fn rm_removes_the_task() {
    let ws = Workspace::new();
    let id = ws.add_task("Backup", Path::new("/jobs/backup.exe"), &[]);

    ws.rota()
        .args(&["task", "rm", &id])
        .passes()
        .stdout_eq("Task 'Backup' removed\n");
    ws.rota()
        .args(&["task", "list"])
        .passes()
        .stdout_eq("No tasks registered\n");
}

#[test]
fn ambiguous_prefix_is_refused() {
    let ws = Workspace::new();
    for id in ["job-a", "job-b"] {
        ws.rota()
            .args(&["task", "add", id, "--id", id, "--target", "/jobs/x.exe"])
            .passes();
    }
    ws.rota()
        .args(&["task", "rm", "job"])
        .fails()
        .stderr_has("matches 2 tasks");
}
