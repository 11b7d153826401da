// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::event_log::spawn_event_logger;
use rota_adapters::FakeLauncher;
use rota_core::test_support::{daily_task, task_id, utc};
use rota_core::{ExitStatus, FakeClock, FixedCalendar, OutputStream, TaskDefinition};
use rota_engine::{SchedulerConfig, SchedulerDeps};
use rota_storage::{MemoryCatalog, MemorySink};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{DuplexStream, ReadHalf, WriteHalf};
use tokio::sync::mpsc;

const SCRIPT: &str = "/srv/jobs/report.py";
const NATIVE: &str = r"C:\jobs\a.exe";

struct Harness {
    scheduler: Scheduler<FakeLauncher, FakeClock, FixedCalendar>,
    launcher: FakeLauncher,
    sink: MemorySink,
    fanout: broadcast::Sender<Event>,
}

impl Harness {
    fn new(tasks: Vec<TaskDefinition>, launcher: FakeLauncher) -> Self {
        let sink = MemorySink::new();
        let (tx, rx) = mpsc::channel(64);
        let (fanout, _) = broadcast::channel(64);
        spawn_event_logger(rx, fanout.clone());
        let scheduler = Scheduler::new(
            SchedulerDeps {
                launcher: launcher.clone(),
                catalog: Arc::new(MemoryCatalog::new(tasks)),
                sink: Arc::new(sink.clone()),
                logger: None,
            },
            FakeClock::new(utc(2026, 3, 2, 7, 0, 0)),
            FixedCalendar::utc(),
            SchedulerConfig::default(),
            tx,
        );
        Self {
            scheduler,
            launcher,
            sink,
            fanout,
        }
    }

    /// Start the scheduler loop; tasks fire at 03:00 so ticks queue nothing.
    fn start(&self) -> CancellationToken {
        let shutdown = CancellationToken::new();
        let scheduler = self.scheduler.clone();
        let token = shutdown.clone();
        tokio::spawn(async move { scheduler.run(token).await });
        shutdown
    }

    /// Open a connection served by `handle_connection`.
    fn connect(&self) -> Client {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (server_r, server_w) = tokio::io::split(server);
        let scheduler = self.scheduler.clone();
        let events = self.fanout.subscribe();
        let served = tokio::spawn(async move {
            handle_connection(server_r, server_w, scheduler, events).await
        });
        let (reader, writer) = tokio::io::split(client);
        Client {
            reader,
            writer,
            served,
        }
    }
}

struct Client {
    reader: ReadHalf<DuplexStream>,
    writer: WriteHalf<DuplexStream>,
    served: tokio::task::JoinHandle<Result<(), ConnectionError>>,
}

impl Client {
    async fn send(&mut self, request: Request) {
        protocol::write_request(&mut self.writer, &request, DEFAULT_TIMEOUT)
            .await
            .unwrap();
    }

    async fn recv(&mut self) -> Response {
        protocol::read_response(&mut self.reader, DEFAULT_TIMEOUT)
            .await
            .unwrap()
    }

    /// Read event responses through the one that ends the run.
    async fn events(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        loop {
            match self.recv().await {
                Response::Event { event } => {
                    let done = protocol::ends_run(&event);
                    events.push(event);
                    if done {
                        return events;
                    }
                }
                other => panic!("unexpected response: {:?}", other),
            }
        }
    }
}

fn report() -> TaskDefinition {
    daily_task("t1", "Report", SCRIPT, 3, 0)
}

#[tokio::test]
async fn run_now_streams_the_queued_execution() {
    let h = Harness::new(vec![report()], FakeLauncher::new());
    let shutdown = h.start();

    let mut client = h.connect();
    client
        .send(Request::RunNow {
            task_id: task_id("t1"),
        })
        .await;
    assert_eq!(client.recv().await, Response::Queued { accepted: true });

    let names: Vec<_> = client.events().await.iter().map(Event::name).collect();
    assert_eq!(names, vec!["execution:started", "execution:finished"]);
    assert_eq!(h.sink.records().len(), 1);
    assert_eq!(h.launcher.calls().len(), 1);

    client.served.await.unwrap().unwrap();
    shutdown.cancel();
}

#[tokio::test]
async fn run_now_for_unknown_task_answers_error() {
    let h = Harness::new(vec![], FakeLauncher::new());

    let mut client = h.connect();
    client
        .send(Request::RunNow {
            task_id: task_id("nope"),
        })
        .await;
    match client.recv().await {
        Response::Error { message } => assert!(message.contains("nope"), "{}", message),
        other => panic!("unexpected response: {:?}", other),
    }
    assert!(h.launcher.calls().is_empty());
}

#[tokio::test]
async fn run_now_twice_in_a_minute_is_not_accepted() {
    // No scheduler loop: the first request stays queued
    let h = Harness::new(vec![report()], FakeLauncher::new());

    let mut first = h.connect();
    first
        .send(Request::RunNow {
            task_id: task_id("t1"),
        })
        .await;
    assert_eq!(first.recv().await, Response::Queued { accepted: true });

    let mut second = h.connect();
    second
        .send(Request::RunNow {
            task_id: task_id("t1"),
        })
        .await;
    assert_eq!(second.recv().await, Response::Queued { accepted: false });
    second.served.await.unwrap().unwrap();

    assert_eq!(h.scheduler.pending().len(), 1);
    first.served.abort();
}

#[tokio::test]
async fn cancel_with_nothing_running_is_idle() {
    let h = Harness::new(vec![], FakeLauncher::new());

    let mut client = h.connect();
    client.send(Request::Cancel).await;
    assert_eq!(client.recv().await, Response::Idle);
}

#[tokio::test]
async fn cancel_stops_a_followed_script() {
    let h = Harness::new(vec![report()], FakeLauncher::gated());
    let shutdown = h.start();

    let mut runner = h.connect();
    runner
        .send(Request::RunNow {
            task_id: task_id("t1"),
        })
        .await;
    assert_eq!(runner.recv().await, Response::Queued { accepted: true });
    h.launcher.wait_for_calls(1).await;

    let mut canceller = h.connect();
    canceller.send(Request::Cancel).await;
    assert_eq!(
        canceller.recv().await,
        Response::Cancelled {
            task_id: task_id("t1")
        }
    );

    let events = runner.events().await;
    let names: Vec<_> = events.iter().map(Event::name).collect();
    assert_eq!(
        names,
        vec![
            "execution:started",
            "execution:cancelled",
            "execution:finished"
        ]
    );
    assert!(matches!(
        events.last(),
        Some(Event::ExecutionFinished {
            exit_status: ExitStatus::Terminated,
            ..
        })
    ));
    shutdown.cancel();
}

#[tokio::test]
async fn cancel_of_native_program_is_rejected() {
    let h = Harness::new(
        vec![daily_task("t1", "Native", NATIVE, 3, 0)],
        FakeLauncher::gated(),
    );
    let shutdown = h.start();

    let mut runner = h.connect();
    runner
        .send(Request::RunNow {
            task_id: task_id("t1"),
        })
        .await;
    assert_eq!(runner.recv().await, Response::Queued { accepted: true });
    h.launcher.wait_for_calls(1).await;

    let mut canceller = h.connect();
    canceller.send(Request::Cancel).await;
    assert!(matches!(
        canceller.recv().await,
        Response::CancelRejected { ref task_id, .. } if task_id == "t1"
    ));

    h.launcher.release(1);
    let events = runner.events().await;
    assert!(events.iter().any(|e| e.name() == "execution:cancel_rejected"));
    assert!(matches!(
        events.last(),
        Some(Event::ExecutionFinished {
            exit_status: ExitStatus::Success,
            ..
        })
    ));
    shutdown.cancel();
}

#[tokio::test]
async fn listener_serves_the_socket_until_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rotad.sock");
    let h = Harness::new(vec![], FakeLauncher::new());

    let listener = Listener::bind(&path, h.scheduler.clone(), h.fanout.clone()).unwrap();
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(listener.run(shutdown.clone()));

    let stream = tokio::net::UnixStream::connect(&path).await.unwrap();
    let (mut reader, mut writer) = stream.into_split();
    protocol::write_request(&mut writer, &Request::Cancel, DEFAULT_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(
        protocol::read_response(&mut reader, DEFAULT_TIMEOUT)
            .await
            .unwrap(),
        Response::Idle
    );

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn bind_replaces_a_stale_socket_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rotad.sock");
    std::fs::write(&path, "").unwrap();
    let h = Harness::new(vec![], FakeLauncher::new());

    let listener = Listener::bind(&path, h.scheduler.clone(), h.fanout.clone());
    assert!(listener.is_ok());
}

// -- RunFollow --

fn started(id: &str, second: u32) -> Event {
    Event::ExecutionStarted {
        task_id: task_id(id),
        started_at: utc(2026, 3, 2, 7, 0, second),
    }
}

fn output(id: &str, text: &str) -> Event {
    Event::ExecutionOutput {
        task_id: task_id(id),
        stream: OutputStream::Stdout,
        text: text.to_string(),
    }
}

fn finished(id: &str) -> Event {
    Event::ExecutionFinished {
        task_id: task_id(id),
        finished_at: utc(2026, 3, 2, 7, 0, 59),
        exit_status: ExitStatus::Success,
    }
}

fn accepted(follow: &mut RunFollow, events: Vec<Event>) -> Vec<Event> {
    events
        .into_iter()
        .filter_map(|event| follow.accept(event))
        .collect()
}

#[test]
fn follow_skips_the_run_already_in_flight() {
    let mut follow = RunFollow::new(task_id("t1"), utc(2026, 3, 2, 7, 0, 10), 0);
    let events = vec![
        output("t1", "old"),
        finished("t1"),
        started("t1", 20),
        output("t1", "new"),
        finished("t1"),
    ];
    assert_eq!(
        accepted(&mut follow, events),
        vec![started("t1", 20), output("t1", "new"), finished("t1")]
    );
}

#[test]
fn follow_skips_runs_queued_ahead() {
    let mut follow = RunFollow::new(task_id("t1"), utc(2026, 3, 2, 7, 0, 0), 1);
    let events = vec![
        started("t1", 5),
        output("t1", "first"),
        finished("t1"),
        started("t1", 30),
        output("t1", "second"),
        finished("t1"),
    ];
    assert_eq!(
        accepted(&mut follow, events),
        vec![started("t1", 30), output("t1", "second"), finished("t1")]
    );
}

#[test]
fn follow_ignores_other_tasks() {
    let mut follow = RunFollow::new(task_id("t1"), utc(2026, 3, 2, 7, 0, 0), 0);
    let events = vec![started("t2", 1), output("t2", "x"), finished("t2")];
    assert!(accepted(&mut follow, events).is_empty());
}

#[test]
fn follow_reports_unsupported_target() {
    let mut follow = RunFollow::new(task_id("t1"), utc(2026, 3, 2, 7, 0, 0), 0);
    let unsupported = Event::TaskUnsupported {
        task_id: task_id("t1"),
        reason: "no extension".to_string(),
    };
    assert_eq!(follow.accept(unsupported.clone()), Some(unsupported));
}
