//! Foreground run specs: `rota run <id>`

use crate::prelude::*;

#[cfg(unix)]
#[test]
fn run_streams_output_and_records_the_execution() {
    let ws = Workspace::new();
    let script = ws.script("job.exe", "echo hello\necho warn >&2");
    let id = ws.add_task("Job", &script, &[]);

    ws.rota()
        .args(&["run", &id])
        .passes()
        .stdout_eq("hello\n")
        .stderr_has("warn")
        .stderr_has("Job: success after");

    let records = ws.executions();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["task_id"], id.as_str());
    assert_eq!(records[0]["exit_status"]["status"], "success");
    assert_eq!(records[0]["stdout"], "hello\n");
    assert_eq!(records[0]["stderr"], "warn\n");

    let log = ws.task_log(&id);
    assert!(log.contains("enqueued (manual)"), "{log}");
    assert!(log.contains("stdout: hello"), "{log}");
    assert!(log.contains("finished: success"), "{log}");
}

#[cfg(unix)]
#[test]
fn run_passes_target_arguments() {
    let ws = Workspace::new();
    let script = ws.script("greet.exe", "echo \"hi $1 $2\"");
    let target = format!("{} there friend", script.display());
    let id = ws.add_task("Greet", std::path::Path::new(&target), &[]);

    ws.rota()
        .args(&["run", &id])
        .passes()
        .stdout_eq("hi there friend\n");
}

#[cfg(unix)]
#[test]
fn failing_task_exits_with_its_code() {
    let ws = Workspace::new();
    let script = ws.script("fail.exe", "echo boom >&2\nexit 3");
    let id = ws.add_task("Fail", &script, &[]);

    let out = ws
        .rota()
        .args(&["run", &id])
        .fails()
        .stderr_has("Fail: failed (exit 3)");
    assert_eq!(out.code(), Some(3));

    let records = ws.executions();
    assert_eq!(records[0]["exit_status"]["status"], "failure");
    assert_eq!(records[0]["exit_status"]["code"], 3);
}

#[cfg(unix)]
#[test]
fn json_output_prints_the_record() {
    let ws = Workspace::new();
    let script = ws.script("job.exe", "echo hello");
    let id = ws.add_task("Job", &script, &[]);

    let json = ws.rota().args(&["run", &id, "-o", "json"]).passes().json();
    assert_eq!(json["task_name"], "Job");
    assert_eq!(json["stdout"], "hello\n");
}

#[test]
fn unsupported_target_is_not_run() {
    let ws = Workspace::new();
    let id = ws.add_task("Notes", std::path::Path::new("/jobs/notes.txt"), &[]);

    let out = ws
        .rota()
        .args(&["run", &id])
        .fails()
        .stderr_has("unsupported target");
    assert_eq!(out.code(), Some(2));
    assert!(ws.executions().is_empty());
}

#[test]
fn manual_run_ignores_schedule_and_enabled_flag() {
    let ws = Workspace::new();
    let id = ws.add_task(
        "Never",
        std::path::Path::new("/jobs/notes.txt"),
        &["--disabled", "--hours", "3", "--minutes", "0"],
    );

    // Queued and dispatched despite rule and flag; rejected only by extension
    ws.rota()
        .args(&["run", &id])
        .fails()
        .stderr_has("unsupported target");
    assert!(ws.task_log(&id).contains("enqueued (manual)"));
}
