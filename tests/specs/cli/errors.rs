//! CLI error reporting specs

use crate::prelude::*;

#[test]
fn unknown_command_fails() {
    cli().args(&["frobnicate"]).fails();
}

#[test]
fn unknown_task_id_is_reported() {
    let ws = Workspace::new();
    ws.rota()
        .args(&["task", "show", "nope"])
        .fails()
        .stderr_has("Error: no task matching 'nope'");
}

#[test]
fn invalid_rule_is_reported_and_nothing_is_saved() {
    let ws = Workspace::new();
    ws.rota()
        .args(&[
            "task", "add", "Backup", "--target", "/jobs/backup.exe", "--hours", "25",
        ])
        .fails()
        .stderr_has("Error:");
    ws.rota()
        .args(&["task", "list"])
        .passes()
        .stdout_eq("No tasks registered\n");
}

#[test]
fn corrupt_catalog_is_an_error_not_an_empty_list() {
    let ws = Workspace::new();
    std::fs::write(ws.state_path().join("catalog.json"), "{not json").unwrap();
    ws.rota()
        .args(&["task", "list"])
        .fails()
        .stderr_has("corrupt catalog");
}

#[test]
fn bad_config_file_is_reported() {
    let ws = Workspace::new();
    ws.config("window = \"mornings\"\n");
    ws.rota()
        .args(&["task", "list"])
        .fails()
        .stderr_has("Invalid config");
}
