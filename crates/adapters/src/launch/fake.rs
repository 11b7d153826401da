// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake launcher for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{LaunchError, Launcher};
use async_trait::async_trait;
use parking_lot::Mutex;
use rota_core::{ExitStatus, LaunchSpec, OutputLine};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;

/// Scripted behaviour for launches of one program
#[derive(Debug, Clone)]
pub struct FakeRun {
    pub output: Vec<OutputLine>,
    /// `Err` simulates a spawn failure with this message
    pub result: Result<ExitStatus, String>,
}

impl FakeRun {
    pub fn exits(status: ExitStatus) -> Self {
        Self {
            output: Vec::new(),
            result: Ok(status),
        }
    }

    pub fn spawn_fails(message: impl Into<String>) -> Self {
        Self {
            output: Vec::new(),
            result: Err(message.into()),
        }
    }

    pub fn with_output(mut self, line: OutputLine) -> Self {
        self.output.push(line);
        self
    }
}

impl Default for FakeRun {
    fn default() -> Self {
        Self::exits(ExitStatus::Success)
    }
}

#[derive(Default)]
struct FakeLauncherState {
    calls: Vec<LaunchSpec>,
    runs: HashMap<String, FakeRun>,
    running: usize,
    max_running: usize,
}

/// Fake launcher for testing.
///
/// Records every spec it is asked to launch. A gated launcher holds each
/// launch open until [`FakeLauncher::release`] grants it a permit, so tests
/// can observe a process "in flight".
#[derive(Clone)]
pub struct FakeLauncher {
    inner: Arc<Mutex<FakeLauncherState>>,
    gate: Option<Arc<Semaphore>>,
}

impl Default for FakeLauncher {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeLauncherState::default())),
            gate: None,
        }
    }
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Launcher whose launches block until released
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::default()
        }
    }

    /// Let `n` held launches finish
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Script the outcome of launching `program`
    pub fn set_run(&self, program: &str, run: FakeRun) {
        self.inner.lock().runs.insert(program.to_string(), run);
    }

    /// Get all recorded launches
    pub fn calls(&self) -> Vec<LaunchSpec> {
        self.inner.lock().calls.clone()
    }

    /// Launches currently in flight
    pub fn running(&self) -> usize {
        self.inner.lock().running
    }

    /// Highest number of launches ever in flight at once
    pub fn max_running(&self) -> usize {
        self.inner.lock().max_running
    }

    /// Wait until at least `n` launches have started
    pub async fn wait_for_calls(&self, n: usize) {
        while self.inner.lock().calls.len() < n {
            tokio::task::yield_now().await;
        }
    }

    fn finish(&self) {
        let mut state = self.inner.lock();
        state.running = state.running.saturating_sub(1);
    }
}

#[async_trait]
impl Launcher for FakeLauncher {
    async fn launch(
        &self,
        spec: &LaunchSpec,
        output: mpsc::Sender<OutputLine>,
        cancel: CancellationToken,
    ) -> Result<ExitStatus, LaunchError> {
        let run = {
            let mut state = self.inner.lock();
            state.calls.push(spec.clone());
            let run = state.runs.get(&spec.program).cloned().unwrap_or_default();
            if run.result.is_ok() {
                state.running += 1;
                state.max_running = state.max_running.max(state.running);
            }
            run
        };

        let status = match run.result {
            Ok(status) => status,
            Err(message) => {
                return Err(LaunchError::Spawn {
                    program: spec.program.clone(),
                    source: std::io::Error::other(message),
                })
            }
        };

        for line in run.output {
            let _ = output.send(line).await;
        }

        if let Some(gate) = &self.gate {
            let cancelled = async {
                if spec.cancellable {
                    cancel.cancelled().await
                } else {
                    std::future::pending().await
                }
            };
            tokio::select! {
                permit = gate.acquire() => {
                    if let Ok(permit) = permit {
                        permit.forget();
                    }
                }
                _ = cancelled => {
                    self.finish();
                    return Ok(ExitStatus::Terminated);
                }
            }
        }

        self.finish();
        Ok(status)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
