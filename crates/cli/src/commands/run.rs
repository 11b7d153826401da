// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rota run`: execute one task now, in the foreground.
//!
//! With `rotad` running, the task goes onto the daemon's queue and waits
//! its turn behind whatever is executing; output is streamed back as the
//! daemon produces it. Otherwise the CLI takes the instance lock and runs
//! the task itself through the same dispatcher, launcher and record sink.
//! Either way the run shows up in `rota logs` and the task's log file.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use rota_adapters::{ProcessLauncher, TracedLauncher};
use rota_core::{
    format_duration, Event, ExecutionRecord, ExitStatus, LocalCalendar, OutputStream, SystemClock,
    TaskDefinition,
};
use rota_daemon::{try_instance_lock, Config};
use rota_engine::{CancelOutcome, Scheduler, SchedulerDeps, TaskLogger};
use rota_storage::{CatalogFile, ExecutionLog};
use tokio::sync::mpsc;

use crate::color;
use crate::commands::resolve::resolve_task;
use crate::exit_error::ExitError;
use crate::output::{print_json, OutputFormat};

const EVENT_BUFFER: usize = 256;

/// Exit code after a cancelled run, as for SIGINT
const TERMINATED_EXIT: i32 = 130;

#[derive(Args)]
pub struct RunArgs {
    /// Task ID or unique prefix
    pub id: String,
}

/// A line to show the user while the task runs.
#[derive(Debug, PartialEq, Eq)]
pub enum Notice {
    Stdout(String),
    Stderr(String),
}

/// What to print for an event; lifecycle events are covered by the summary.
pub fn notice(event: &Event) -> Option<Notice> {
    match event {
        Event::ExecutionOutput { stream, text, .. } => Some(match stream {
            OutputStream::Stdout => Notice::Stdout(text.clone()),
            OutputStream::Stderr => Notice::Stderr(text.clone()),
        }),
        Event::TaskUnsupported { reason, .. } => {
            Some(Notice::Stderr(format!("unsupported target: {}", reason)))
        }
        Event::CancelRejected { reason, .. } => {
            Some(Notice::Stderr(format!("cannot cancel: {}", reason)))
        }
        _ => None,
    }
}

fn show(event: &Event, format: OutputFormat) {
    if format != OutputFormat::Text {
        return;
    }
    match notice(event) {
        Some(Notice::Stdout(text)) => println!("{}", text),
        Some(Notice::Stderr(text)) => eprintln!("{}", text),
        None => {}
    }
}

/// Process exit code for a finished run.
pub fn exit_code(status: &ExitStatus) -> i32 {
    match status {
        ExitStatus::Success => 0,
        ExitStatus::Failure { code: Some(code) } if *code != 0 => *code,
        ExitStatus::Failure { .. } => 1,
        ExitStatus::Terminated => TERMINATED_EXIT,
    }
}

pub async fn handle(args: RunArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let catalog = Arc::new(CatalogFile::new(config.catalog_path.clone()));
    let task = resolve_task(&catalog.list()?, &args.id)?;

    std::fs::create_dir_all(&config.state_dir)?;
    let record = match try_instance_lock(&config.lock_path)? {
        Some(lock) => {
            let record = run_in_process(&task, catalog, config, format).await;
            drop(lock);
            record?
        }
        None => run_through_daemon(&task, config, format).await?,
    };

    let Some(record) = record else {
        return Err(ExitError::new(
            2,
            format!("task '{}' was not run: unsupported target", task.name),
        )
        .into());
    };
    report(&record, format)?;

    match exit_code(&record.exit_status) {
        0 => Ok(()),
        code => Err(ExitError::silent(code).into()),
    }
}

/// Run on a private scheduler while holding the instance lock.
async fn run_in_process(
    task: &TaskDefinition,
    catalog: Arc<CatalogFile>,
    config: &Config,
    format: OutputFormat,
) -> Result<Option<ExecutionRecord>> {
    let (event_tx, mut event_rx) = mpsc::channel(EVENT_BUFFER);
    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            show(&event, format);
        }
    });

    std::fs::create_dir_all(&config.logs_path)?;
    let deps = SchedulerDeps {
        launcher: TracedLauncher::new(ProcessLauncher::new()),
        catalog,
        sink: Arc::new(ExecutionLog::new(config.execution_log_path.clone())),
        logger: Some(TaskLogger::new(config.logs_path.clone())),
    };
    let scheduler = Scheduler::new(
        deps,
        SystemClock,
        LocalCalendar,
        config.scheduler.clone(),
        event_tx,
    );

    scheduler.run_now(&task.id).await?;
    let records = {
        let drain = scheduler.drain();
        tokio::pin!(drain);
        loop {
            tokio::select! {
                records = &mut drain => break records,
                _ = tokio::signal::ctrl_c() => {
                    if let CancelOutcome::Cancelled { .. } = scheduler.cancel_current().await {
                        eprintln!("{}", color::context("cancelling..."));
                    }
                }
            }
        }
    };

    // Closing the channel ends the printer once the backlog is out
    drop(scheduler);
    let _ = printer.await;
    Ok(records.into_iter().next())
}

/// Queue on the running daemon and follow the run to its end.
#[cfg(unix)]
async fn run_through_daemon(
    task: &TaskDefinition,
    config: &Config,
    format: OutputFormat,
) -> Result<Option<ExecutionRecord>> {
    use crate::client::DaemonClient;
    use rota_daemon::Response;

    let client = DaemonClient::new(config.socket_path.clone());
    let Some(mut run) = client.run_now(&task.id).await? else {
        anyhow::bail!(
            "task '{}' is already queued in rotad for this minute",
            task.name
        );
    };
    if format == OutputFormat::Text {
        eprintln!("{}", color::context("queued in rotad"));
    }

    let mut followed = Vec::new();
    let mut cancel_sent = false;
    loop {
        let event = tokio::select! {
            next = run.next() => match next? {
                Some(event) => event,
                None => anyhow::bail!(
                    "rotad closed the connection before '{}' finished",
                    task.name
                ),
            },
            _ = tokio::signal::ctrl_c() => {
                let started = followed
                    .iter()
                    .any(|e| matches!(e, Event::ExecutionStarted { .. }));
                if !started {
                    eprintln!(
                        "{}",
                        color::context(&format!("'{}' stays queued in rotad", task.name))
                    );
                    return Err(ExitError::silent(TERMINATED_EXIT).into());
                }
                if !cancel_sent {
                    cancel_sent = true;
                    if let Response::Cancelled { .. } = client.cancel().await? {
                        eprintln!("{}", color::context("cancelling..."));
                    }
                }
                continue;
            }
        };

        show(&event, format);
        match &event {
            Event::TaskUnsupported { .. } => return Ok(None),
            Event::ExecutionFinished { finished_at, .. } => {
                let persisted = ExecutionLog::new(config.execution_log_path.clone())
                    .all()?
                    .into_iter()
                    .rev()
                    .find(|r| r.task_id == task.id && r.finished_at == *finished_at);
                followed.push(event);
                return Ok(persisted.or_else(|| record_from_events(task, &followed)));
            }
            _ => followed.push(event),
        }
    }
}

#[cfg(not(unix))]
async fn run_through_daemon(
    task: &TaskDefinition,
    config: &Config,
    _format: OutputFormat,
) -> Result<Option<ExecutionRecord>> {
    anyhow::bail!(
        "rotad holds {}; stop it to run '{}' from here",
        config.lock_path.display(),
        task.name
    )
}

/// Rebuild a record from the streamed events of one run.
pub fn record_from_events(task: &TaskDefinition, events: &[Event]) -> Option<ExecutionRecord> {
    let mut started_at = None;
    let mut stdout = String::new();
    let mut stderr = String::new();
    for event in events {
        match event {
            Event::ExecutionStarted { started_at: at, .. } => started_at = Some(*at),
            Event::ExecutionOutput { stream, text, .. } => {
                let buf = match stream {
                    OutputStream::Stdout => &mut stdout,
                    OutputStream::Stderr => &mut stderr,
                };
                buf.push_str(text);
                buf.push('\n');
            }
            Event::ExecutionFinished {
                finished_at,
                exit_status,
                ..
            } => {
                return Some(ExecutionRecord {
                    task_id: task.id.clone(),
                    task_name: task.name.clone(),
                    started_at: started_at.unwrap_or(*finished_at),
                    finished_at: *finished_at,
                    exit_status: *exit_status,
                    stdout,
                    stderr,
                })
            }
            _ => {}
        }
    }
    None
}

fn report(record: &ExecutionRecord, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            eprintln!(
                "{}: {} after {}",
                record.task_name,
                color::status(&record.exit_status.to_string()),
                format_duration(record.elapsed())
            );
        }
        OutputFormat::Json => print_json(record)?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
