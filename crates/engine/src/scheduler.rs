// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler loop: periodic evaluation feeding a single-lane executor.
//!
//! Two activities share one [`RunQueue`]:
//!
//! - the tick activity wakes every `tick_period`, skips ticks outside the
//!   active window, asks the catalog for enabled tasks, offers every task
//!   whose rule matches the current minute, and signals the drain;
//! - the drain activity takes queued items one at a time, launches each,
//!   waits for it to finish and hands the record to the sink.
//!
//! Ticks keep their cadence while a launch is running, so items due
//! during a long execution queue up behind it.

use crate::dispatch::{build_launch_spec, DispatchConfig, DispatchError};
use crate::error::SchedulerError;
use crate::matcher::matches;
use crate::queue::RunQueue;
use crate::task_logger::TaskLogger;
use parking_lot::Mutex;
use rota_adapters::Launcher;
use rota_core::{
    format_duration, truncate_to_minute, ActiveWindow, Calendar, CalendarFields, Clock, Event,
    ExecutionRecord, ExitStatus, OutputStream, QueueItem, TaskDefinition, TaskId,
};
use rota_storage::{RecordSink, TaskCatalog};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Scheduler cadence and launch configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub tick_period: Duration,
    pub window: ActiveWindow,
    pub dispatch: DispatchConfig,
    /// Capacity of the per-execution output line channel
    pub output_buffer: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_secs(60),
            window: ActiveWindow::default(),
            dispatch: DispatchConfig::default(),
            output_buffer: 256,
        }
    }
}

/// Collaborators the scheduler drives
pub struct SchedulerDeps<L> {
    pub launcher: L,
    pub catalog: Arc<dyn TaskCatalog>,
    pub sink: Arc<dyn RecordSink>,
    pub logger: Option<TaskLogger>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Evaluating,
    Stopped,
}

/// Result of a cancellation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The running execution was told to stop
    Cancelled { task_id: TaskId },
    /// The running execution cannot be interrupted; it continues
    Rejected { task_id: TaskId, reason: String },
    /// Nothing is executing
    Idle,
}

struct Running {
    task_id: TaskId,
    cancellable: bool,
    token: CancellationToken,
}

struct SchedulerContext<L, C, K> {
    config: SchedulerConfig,
    launcher: L,
    clock: C,
    calendar: K,
    catalog: Arc<dyn TaskCatalog>,
    sink: Arc<dyn RecordSink>,
    logger: Option<TaskLogger>,
    events: mpsc::Sender<Event>,
    queue: Mutex<RunQueue>,
    wake: Notify,
    state: Mutex<SchedulerState>,
    running: Mutex<Option<Running>>,
    /// Tasks already reported for a never-matching rule
    misconfigured: Mutex<HashSet<TaskId>>,
}

/// Periodic evaluator and sequential executor of registered tasks.
///
/// Cheap to clone; clones share the same queue and state.
pub struct Scheduler<L, C, K> {
    ctx: Arc<SchedulerContext<L, C, K>>,
}

impl<L, C, K> Clone for Scheduler<L, C, K> {
    fn clone(&self) -> Self {
        Self {
            ctx: Arc::clone(&self.ctx),
        }
    }
}

impl<L, C, K> Scheduler<L, C, K>
where
    L: Launcher,
    C: Clock,
    K: Calendar,
{
    /// Create a scheduler publishing to `events`.
    ///
    /// The event receiver must be drained; a full channel applies
    /// backpressure to both activities.
    pub fn new(
        deps: SchedulerDeps<L>,
        clock: C,
        calendar: K,
        config: SchedulerConfig,
        events: mpsc::Sender<Event>,
    ) -> Self {
        Self {
            ctx: Arc::new(SchedulerContext {
                config,
                launcher: deps.launcher,
                clock,
                calendar,
                catalog: deps.catalog,
                sink: deps.sink,
                logger: deps.logger,
                events,
                queue: Mutex::new(RunQueue::new()),
                wake: Notify::new(),
                state: Mutex::new(SchedulerState::Idle),
                running: Mutex::new(None),
                misconfigured: Mutex::new(HashSet::new()),
            }),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.ctx.config
    }

    pub fn state(&self) -> SchedulerState {
        *self.ctx.state.lock()
    }

    /// Items waiting to execute, oldest first
    pub fn pending(&self) -> Vec<QueueItem> {
        self.ctx.queue.lock().snapshot()
    }

    /// Current time on the scheduler's clock
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.ctx.clock.now()
    }

    /// Task currently executing, if any
    pub fn current(&self) -> Option<TaskId> {
        self.ctx.running.lock().as_ref().map(|r| r.task_id.clone())
    }

    /// Run both activities until `shutdown` is cancelled.
    ///
    /// An execution in flight at shutdown runs to completion and is
    /// recorded; nothing further is taken from the queue.
    pub async fn run(&self, shutdown: CancellationToken) {
        let period = self.ctx.config.tick_period.max(Duration::from_millis(1));
        tracing::info!(
            tick_secs = period.as_secs(),
            window = %self.ctx.config.window,
            "scheduler started"
        );

        let drain = {
            let this = self.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move { this.drain_loop(shutdown).await })
        };

        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }

        if let Err(e) = drain.await {
            tracing::error!(error = %e, "drain task failed");
        }
        self.set_state(SchedulerState::Stopped);
        tracing::info!("scheduler stopped");
    }

    /// Evaluate at the clock's current time.
    pub async fn tick(&self) -> usize {
        self.tick_at(self.ctx.clock.now()).await
    }

    /// Evaluate every enabled task against `now`; returns how many were enqueued.
    pub async fn tick_at(&self, now: chrono::DateTime<chrono::Utc>) -> usize {
        let fields = self.ctx.calendar.fields(now);
        if !self.ctx.config.window.contains(&fields) {
            tracing::trace!(
                window = %self.ctx.config.window,
                hour = fields.hour,
                minute = fields.minute,
                "outside active window, skipping tick"
            );
            return 0;
        }

        self.set_state(SchedulerState::Evaluating);
        let accepted = self.evaluate(now, &fields);
        self.set_state(SchedulerState::Idle);

        let minute = truncate_to_minute(now);
        for task in &accepted {
            self.announce_enqueued(task, minute, "scheduled").await;
        }
        self.ctx.wake.notify_one();
        accepted.len()
    }

    /// Queue a task now, regardless of its rule and the active window.
    ///
    /// Returns `Ok(false)` if the task was already queued this minute.
    pub async fn run_now(&self, task_id: &TaskId) -> Result<bool, SchedulerError> {
        let task = self
            .ctx
            .catalog
            .get(task_id)?
            .ok_or_else(|| SchedulerError::TaskNotFound(task_id.clone()))?;

        let now = self.ctx.clock.now();
        let accepted = self.ctx.queue.lock().offer(task.id.clone(), now);
        if accepted {
            self.announce_enqueued(&task, truncate_to_minute(now), "manual")
                .await;
            self.ctx.wake.notify_one();
        } else {
            tracing::info!(task_id = %task.id, "already queued this minute");
        }
        Ok(accepted)
    }

    /// Stop the running execution if its launch mechanism allows it.
    pub async fn cancel_current(&self) -> CancelOutcome {
        let running = self
            .ctx
            .running
            .lock()
            .as_ref()
            .map(|r| (r.task_id.clone(), r.cancellable, r.token.clone()));

        match running {
            None => CancelOutcome::Idle,
            Some((task_id, true, token)) => {
                tracing::info!(task_id = %task_id, "cancelling execution");
                token.cancel();
                CancelOutcome::Cancelled { task_id }
            }
            Some((task_id, false, _)) => {
                let reason = "launch mechanism does not support cancellation".to_string();
                tracing::warn!(task_id = %task_id, %reason, "cancel rejected");
                self.emit(Event::CancelRejected {
                    task_id: task_id.clone(),
                    reason: reason.clone(),
                })
                .await;
                CancelOutcome::Rejected { task_id, reason }
            }
        }
    }

    /// Execute queued items in order until the queue is empty.
    pub async fn drain(&self) -> Vec<ExecutionRecord> {
        let mut records = Vec::new();
        while let Some(item) = self.pop() {
            records.extend(self.execute(item).await);
        }
        records
    }

    async fn drain_loop(&self, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = self.ctx.wake.notified() => {}
            }
            while !shutdown.is_cancelled() {
                let Some(item) = self.pop() else { break };
                self.execute(item).await;
            }
        }
    }

    fn pop(&self) -> Option<QueueItem> {
        self.ctx.queue.lock().pop()
    }

    fn set_state(&self, state: SchedulerState) {
        *self.ctx.state.lock() = state;
    }

    /// Offer every matching enabled task; returns the ones accepted.
    fn evaluate(
        &self,
        now: chrono::DateTime<chrono::Utc>,
        fields: &CalendarFields,
    ) -> Vec<TaskDefinition> {
        let tasks = match self.ctx.catalog.enabled_tasks() {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::warn!(error = %e, "catalog read failed, skipping tick");
                return Vec::new();
            }
        };

        let mut accepted = Vec::new();
        for task in tasks {
            self.check_rule(&task);
            if !matches(&task.schedule, fields) {
                continue;
            }
            if self.ctx.queue.lock().offer(task.id.clone(), now) {
                accepted.push(task);
            } else {
                tracing::debug!(task_id = %task.id, "duplicate offer ignored");
            }
        }
        accepted
    }

    /// Report rules that can never fire, once per task.
    fn check_rule(&self, task: &TaskDefinition) {
        let empty = task.schedule.empty_fields();
        if empty.is_empty() {
            return;
        }
        if self.ctx.misconfigured.lock().insert(task.id.clone()) {
            let fields: Vec<&str> = empty.iter().map(|k| k.name()).collect();
            tracing::warn!(
                task_id = %task.id,
                name = %task.name,
                ?fields,
                "schedule rule has empty fields and will never fire"
            );
        }
    }

    async fn announce_enqueued(
        &self,
        task: &TaskDefinition,
        minute: chrono::DateTime<chrono::Utc>,
        trigger: &str,
    ) {
        tracing::info!(task_id = %task.id, name = %task.name, trigger, "task enqueued");
        self.log(&task.id, &format!("enqueued ({})", trigger));
        self.emit(Event::TaskEnqueued {
            task_id: task.id.clone(),
            minute,
        })
        .await;
    }

    async fn execute(&self, item: QueueItem) -> Option<ExecutionRecord> {
        let ctx = &self.ctx;
        let task = match ctx.catalog.get(&item.task_id) {
            Ok(Some(task)) => task,
            Ok(None) => {
                tracing::warn!(task_id = %item.task_id, "queued task no longer in catalog");
                return None;
            }
            Err(e) => {
                tracing::warn!(task_id = %item.task_id, error = %e, "catalog read failed, dropping item");
                return None;
            }
        };

        let spec = match build_launch_spec(&task, &ctx.config.dispatch) {
            Ok(spec) => spec,
            Err(DispatchError::UnsupportedTarget { target, reason }) => {
                tracing::warn!(task_id = %task.id, target, %reason, "unsupported target");
                self.log(&task.id, &format!("unsupported target: {}", reason));
                self.emit(Event::TaskUnsupported {
                    task_id: task.id.clone(),
                    reason,
                })
                .await;
                return None;
            }
        };

        let token = CancellationToken::new();
        *ctx.running.lock() = Some(Running {
            task_id: task.id.clone(),
            cancellable: spec.cancellable,
            token: token.clone(),
        });

        let started_at = ctx.clock.now();
        tracing::info!(task_id = %task.id, name = %task.name, command = %spec.command_line(), "execution started");
        self.log(&task.id, &format!("started: {}", spec.command_line()));
        self.emit(Event::ExecutionStarted {
            task_id: task.id.clone(),
            started_at,
        })
        .await;

        let (tx, mut rx) = mpsc::channel(ctx.config.output_buffer.max(1));
        let launch = ctx.launcher.launch(&spec, tx, token);
        let collect = async {
            let mut stdout = String::new();
            let mut stderr = String::new();
            while let Some(line) = rx.recv().await {
                let buf = match line.stream {
                    OutputStream::Stdout => &mut stdout,
                    OutputStream::Stderr => &mut stderr,
                };
                buf.push_str(&line.text);
                buf.push('\n');
                self.log(&task.id, &format!("{}: {}", line.stream, line.text));
                self.emit(Event::ExecutionOutput {
                    task_id: task.id.clone(),
                    stream: line.stream,
                    text: line.text,
                })
                .await;
            }
            (stdout, stderr)
        };
        let (result, (stdout, mut stderr)) = tokio::join!(launch, collect);
        *ctx.running.lock() = None;

        let exit_status = match result {
            Ok(status) => status,
            Err(e) => {
                tracing::error!(task_id = %task.id, error = %e, "launch failed");
                stderr.push_str(&e.to_string());
                stderr.push('\n');
                ExitStatus::Failure { code: None }
            }
        };

        let finished_at = ctx.clock.now();
        if exit_status == ExitStatus::Terminated {
            self.emit(Event::ExecutionCancelled {
                task_id: task.id.clone(),
            })
            .await;
        }
        let elapsed = format_duration(finished_at - started_at);
        tracing::info!(task_id = %task.id, status = %exit_status, %elapsed, "execution finished");
        self.log(
            &task.id,
            &format!("finished: {} after {}", exit_status, elapsed),
        );

        let record = ExecutionRecord {
            task_id: task.id,
            task_name: task.name,
            started_at,
            finished_at,
            exit_status,
            stdout,
            stderr,
        };
        if let Err(e) = ctx.sink.persist(&record) {
            tracing::warn!(task_id = %record.task_id, error = %e, "failed to persist execution record");
        }

        // Published after persisting so a subscriber can read the record back
        self.emit(Event::ExecutionFinished {
            task_id: record.task_id.clone(),
            finished_at,
            exit_status,
        })
        .await;
        Some(record)
    }

    fn log(&self, task_id: &TaskId, message: &str) {
        if let Some(logger) = &self.ctx.logger {
            logger.append(task_id, message);
        }
    }

    async fn emit(&self, event: Event) {
        tracing::debug!(event = %event.log_summary(), "emit");
        if self.ctx.events.send(event).await.is_err() {
            tracing::trace!("event receiver dropped");
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
