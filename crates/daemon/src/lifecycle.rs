// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and shutdown.
//!
//! The exclusive lock on `rotad.pid` marks the one process allowed to
//! execute tasks from the state directory. `rotad` holds it for its whole
//! life; `rota run` takes it through [`try_instance_lock`] when no daemon
//! is running and executes in-process.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use fs2::FileExt;
use rota_adapters::{ProcessLauncher, TracedLauncher};
use rota_core::{LocalCalendar, SystemClock};
use rota_engine::{Scheduler, SchedulerDeps, TaskLogger};
use rota_storage::{CatalogFile, ExecutionLog};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::event_log::spawn_event_logger;
#[cfg(unix)]
use crate::listener::Listener;

/// Scheduler with concrete adapter types (wrapped with tracing)
pub type DaemonScheduler = Scheduler<TracedLauncher<ProcessLauncher>, SystemClock, LocalCalendar>;

const EVENT_BUFFER: usize = 256;
/// Per-client backlog before a slow client starts missing events
const FANOUT_BUFFER: usize = 1024;
const EVENT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Running daemon state
pub struct Daemon {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub scheduler: DaemonScheduler,
    event_logger: JoinHandle<()>,
    #[cfg(unix)]
    listener: Option<Listener<TracedLauncher<ProcessLauncher>, SystemClock, LocalCalendar>>,
}

/// Start the daemon: take the instance lock and wire the scheduler.
///
/// Must be called inside a tokio runtime.
pub async fn startup(config: &Config) -> Result<Daemon, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;
    let lock_file = acquire_lock(&config.lock_path)?;
    std::fs::create_dir_all(&config.logs_path)?;

    let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
    let (fanout, _) = broadcast::channel(FANOUT_BUFFER);
    let event_logger = spawn_event_logger(event_rx, fanout.clone());

    let deps = SchedulerDeps {
        launcher: TracedLauncher::new(ProcessLauncher::new()),
        catalog: Arc::new(CatalogFile::new(config.catalog_path.clone())),
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

    #[cfg(unix)]
    let listener = Listener::bind(&config.socket_path, scheduler.clone(), fanout)?;
    #[cfg(not(unix))]
    drop(fanout);

    info!(
        state_dir = %config.state_dir.display(),
        catalog = %config.catalog_path.display(),
        socket = %config.socket_path.display(),
        "daemon started"
    );

    Ok(Daemon {
        config: config.clone(),
        lock_file,
        scheduler,
        event_logger,
        #[cfg(unix)]
        listener: Some(listener),
    })
}

/// Lock the PID file and write our PID into it.
///
/// The file is opened without truncation so a failed attempt leaves the
/// running daemon's PID intact.
fn acquire_lock(path: &Path) -> Result<File, LifecycleError> {
    let mut lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    Ok(lock_file)
}

/// Instance lock taken by a process other than `rotad`.
///
/// Released on drop. A lock file this process created is removed first.
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
    file: File,
    created: bool,
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        if self.created {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), "Failed to remove lock file: {}", e);
            }
        }
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(path = %self.path.display(), "Failed to release lock: {}", e);
        }
    }
}

/// Take the instance lock unless another process holds it.
///
/// Returns `Ok(None)` when the lock is held, typically by a running daemon.
/// The file's contents are left alone.
pub fn try_instance_lock(path: &Path) -> std::io::Result<Option<InstanceLock>> {
    let created = !path.exists();
    let file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    match FileExt::try_lock_exclusive(&file) {
        Ok(()) => Ok(Some(InstanceLock {
            path: path.to_path_buf(),
            file,
            created,
        })),
        Err(e) if is_contended(&e) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Whether some process holds the instance lock at `path`.
pub fn instance_locked(path: &Path) -> std::io::Result<bool> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    match FileExt::try_lock_shared(&file) {
        Ok(()) => {
            FileExt::unlock(&file)?;
            Ok(false)
        }
        Err(e) if is_contended(&e) => Ok(true),
        Err(e) => Err(e),
    }
}

fn is_contended(e: &std::io::Error) -> bool {
    e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

impl Daemon {
    /// Run the scheduler and the control socket until `shutdown` fires,
    /// then clean up.
    pub async fn run(mut self, shutdown: CancellationToken) {
        #[cfg(unix)]
        let listener = self
            .listener
            .take()
            .map(|listener| tokio::spawn(listener.run(shutdown.clone())));

        self.scheduler.run(shutdown).await;

        #[cfg(unix)]
        if let Some(listener) = listener {
            if let Err(e) = listener.await {
                warn!("Listener ended abnormally: {}", e);
            }
        }
        self.shutdown().await;
    }

    /// Flush the event log and release the instance lock.
    pub async fn shutdown(self) {
        let Daemon {
            config,
            lock_file,
            scheduler,
            event_logger,
            #[cfg(unix)]
            listener,
        } = self;

        // Last sender goes with the scheduler and the listener's handle on it
        drop(scheduler);
        #[cfg(unix)]
        drop(listener);
        match tokio::time::timeout(EVENT_FLUSH_TIMEOUT, event_logger).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Event logger ended abnormally: {}", e),
            Err(_) => warn!("Event logger still busy at shutdown"),
        }

        if config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&config.socket_path) {
                warn!("Failed to remove socket: {}", e);
            }
        }
        if config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }
        drop(lock_file);
        info!("Daemon shutdown complete");
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
