//! Execution log export specs

use crate::prelude::*;

fn record(task: &str, started_at: &str, status: &str) -> String {
    format!(
        r#"{{"task_id":"{task}","task_name":"{task}","started_at":"{started_at}","finished_at":"{started_at}","exit_status":{{"status":"{status}"}},"stdout":"ok\n","stderr":""}}"#
    )
}

fn seed(ws: &Workspace, lines: &[String]) {
    let dir = ws.state_path().join("logs");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("executions.jsonl"), lines.join("\n") + "\n").unwrap();
}

fn task_ids(json: &serde_json::Value) -> Vec<&str> {
    json.as_array()
        .unwrap()
        .iter()
        .map(|r| r["task_id"].as_str().unwrap())
        .collect()
}

#[test]
fn logs_filter_by_period() {
    let ws = Workspace::new();
    seed(
        &ws,
        &[
            record("early", "2020-01-01T12:00:00Z", "success"),
            record("inside", "2020-01-05T12:00:00Z", "success"),
            record("late", "2020-01-09T12:00:00Z", "terminated"),
        ],
    );

    let json = ws
        .rota()
        .args(&[
            "logs", "--since", "2020-01-03", "--until", "2020-01-07", "-o", "json",
        ])
        .passes()
        .json();
    assert_eq!(task_ids(&json), vec!["inside"]);
}

#[test]
fn logs_filter_by_task_prefix() {
    let ws = Workspace::new();
    seed(
        &ws,
        &[
            record("backup", "2020-01-05T10:00:00Z", "success"),
            record("report", "2020-01-05T11:00:00Z", "success"),
        ],
    );

    let json = ws
        .rota()
        .args(&[
            "logs", "--since", "2020-01-01", "--until", "2020-02-01", "--task", "rep", "-o",
            "json",
        ])
        .passes()
        .json();
    assert_eq!(task_ids(&json), vec!["report"]);
}

#[test]
fn empty_period_says_so() {
    let ws = Workspace::new();
    ws.rota()
        .args(&["logs", "--since", "2020-01-01", "--until", "2020-01-02"])
        .passes()
        .stdout_eq("No executions in this period\n");
}

#[test]
fn inverted_period_is_an_error() {
    let ws = Workspace::new();
    ws.rota()
        .args(&["logs", "--since", "2020-01-02", "--until", "2020-01-01"])
        .fails()
        .stderr_has("--since must be before --until");
}
