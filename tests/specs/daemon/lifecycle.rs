//! Daemon lifecycle specs: instance lock, scheduled runs, shutdown

use crate::prelude::*;

#[cfg(unix)]
/// Tick every second with the window open around the clock
const FAST: &[(&str, &str)] = &[("ROTA_TICK_SECS", "1"), ("ROTA_WINDOW", "00:00-00:00")];

#[cfg(unix)]
#[test]
fn daemon_writes_pid_and_removes_it_on_sigterm() {
    let ws = Workspace::new();
    let daemon = ws.start_daemon(FAST);
    let pid = daemon.pid().to_string();

    let pid_path = ws.pid_path();
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || {
            std::fs::read_to_string(&pid_path).is_ok_and(|p| p.trim() == pid)
        }),
        "pid file never appeared\n{}",
        ws.daemon_log()
    );

    let status = daemon.terminate();
    assert!(status.success(), "rotad exited with {status:?}");
    assert!(!pid_path.exists());
    assert!(!ws.state_path().join("rotad.sock").exists());
    assert!(ws.daemon_log().contains("Daemon shutdown complete"));
}

#[cfg(unix)]
#[test]
fn second_daemon_is_refused() {
    let ws = Workspace::new();
    let first = ws.start_daemon(FAST);
    assert!(wait_for(SPEC_WAIT_MAX_MS, || ws.pid_path().exists()));

    let out = std::process::Command::new(rotad_binary())
        .env("ROTA_STATE_DIR", ws.state_path())
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("rotad is already running"), "{stderr}");
    assert!(stderr.contains(&first.pid().to_string()), "{stderr}");

    first.terminate();
}

#[cfg(unix)]
#[test]
fn daemon_runs_due_tasks_once_per_minute() {
    let ws = Workspace::new();
    let script = ws.script("tick.exe", "echo tick");
    let id = ws.add_task("Tick", &script, &[]);

    let daemon = ws.start_daemon(FAST);
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || !ws.executions().is_empty()),
        "task never ran\n{}",
        ws.daemon_log()
    );

    // Further ticks in the same minute must not enqueue it again
    std::thread::sleep(std::time::Duration::from_millis(2500));
    daemon.terminate();

    let records = ws.executions();
    let minutes: std::collections::HashSet<String> = records
        .iter()
        .map(|r| r["started_at"].as_str().unwrap()[..16].to_string())
        .collect();
    assert_eq!(records.len(), minutes.len(), "{records:?}");
    assert_eq!(records[0]["task_id"], id.as_str());
    assert_eq!(records[0]["stdout"], "tick\n");
    assert!(ws.task_log(&id).contains("enqueued (scheduled)"));
}

#[cfg(unix)]
#[test]
fn closed_window_runs_nothing() {
    let ws = Workspace::new();
    let script = ws.script("tick.exe", "echo tick");
    ws.add_task("Tick", &script, &[]);

    // A one-minute window twelve hours from now is closed for this test
    let hour = (local_hour() + 12) % 24;
    let window = format!("{hour:02}:00-{hour:02}:01");
    let daemon = ws.start_daemon(&[("ROTA_TICK_SECS", "1"), ("ROTA_WINDOW", window.as_str())]);
    assert!(wait_for(SPEC_WAIT_MAX_MS, || ws.pid_path().exists()));
    std::thread::sleep(std::time::Duration::from_millis(1500));
    daemon.terminate();

    assert!(ws.executions().is_empty());
}

#[cfg(unix)]
/// Current local hour, as reported by `date`
fn local_hour() -> u32 {
    let out = std::process::Command::new("date").arg("+%H").output().unwrap();
    String::from_utf8_lossy(&out.stdout).trim().parse().unwrap()
}

#[cfg(unix)]
fn timestamp(record: &serde_json::Value, field: &str) -> chrono::DateTime<chrono::Utc> {
    let text = record[field].as_str().unwrap();
    chrono::DateTime::parse_from_rfc3339(text)
        .unwrap()
        .with_timezone(&chrono::Utc)
}

#[cfg(unix)]
#[test]
fn manual_run_waits_in_the_daemon_queue() {
    let ws = Workspace::new();
    let slow = ws.script("slow.exe", "sleep 2\necho slow");
    let fast = ws.script("fast.exe", "echo fast");
    let slow_id = ws.add_task("Slow", &slow, &[]);
    let fast_id = ws.add_task("Fast", &fast, &["--disabled"]);

    let daemon = ws.start_daemon(FAST);
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || ws.task_log(&slow_id).contains("started")),
        "scheduled task never started\n{}",
        ws.daemon_log()
    );

    ws.rota()
        .args(&["run", &fast_id])
        .passes()
        .stdout_eq("fast\n")
        .stderr_has("queued in rotad")
        .stderr_has("Fast: success after");
    daemon.terminate();

    let records = ws.executions();
    let fast_record = records
        .iter()
        .find(|r| r["task_id"] == fast_id.as_str())
        .unwrap();
    assert_eq!(fast_record["stdout"], "fast\n");

    // One lane: the manual run never overlaps a scheduled one
    let fast_start = timestamp(fast_record, "started_at");
    let fast_end = timestamp(fast_record, "finished_at");
    let slow_records: Vec<_> = records
        .iter()
        .filter(|r| r["task_id"] == slow_id.as_str())
        .collect();
    assert!(!slow_records.is_empty());
    for slow in slow_records {
        let before = timestamp(slow, "finished_at") <= fast_start;
        let after = timestamp(slow, "started_at") >= fast_end;
        assert!(before || after, "overlapping runs: {records:?}");
    }

    assert!(ws.task_log(&fast_id).contains("enqueued (manual)"));
    assert!(ws.daemon_log().contains("received request"));
}

#[cfg(unix)]
#[test]
fn cancel_reaches_the_running_daemon() {
    let ws = Workspace::new();
    ws.rota()
        .args(&["cancel"])
        .fails()
        .stderr_has("rotad is not running");

    let socket = ws.state_path().join("rotad.sock");
    let daemon = ws.start_daemon(FAST);
    assert!(wait_for(SPEC_WAIT_MAX_MS, || socket.exists()));
    ws.rota()
        .args(&["cancel"])
        .passes()
        .stdout_eq("Nothing is running\n");
    daemon.terminate();
}

#[cfg(unix)]
#[test]
fn run_without_daemon_leaves_no_lock_behind() {
    let ws = Workspace::new();
    let script = ws.script("job.exe", "echo hi");
    let id = ws.add_task("Job", &script, &[]);

    ws.rota().args(&["run", &id]).passes().stdout_eq("hi\n");
    assert!(!ws.pid_path().exists());

    // The daemon still starts afterwards
    let daemon = ws.start_daemon(FAST);
    assert!(wait_for(SPEC_WAIT_MAX_MS, || ws.pid_path().exists()));
    daemon.terminate();
}
