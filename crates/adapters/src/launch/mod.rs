// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process launch adapters

mod process;

pub use process::ProcessLauncher;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeLauncher, FakeRun};

use async_trait::async_trait;
use rota_core::{ExitStatus, LaunchSpec, OutputLine};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Errors from launching a process
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runs one external process to completion.
///
/// Output lines are sent on `output` as they arrive, in order within each
/// stream. When `spec.cancellable` is set, cancelling `cancel` terminates
/// the process and the launch returns [`ExitStatus::Terminated`]; for other
/// specs the token is ignored and the process runs to its natural end.
#[async_trait]
pub trait Launcher: Clone + Send + Sync + 'static {
    async fn launch(
        &self,
        spec: &LaunchSpec,
        output: mpsc::Sender<OutputLine>,
        cancel: CancellationToken,
    ) -> Result<ExitStatus, LaunchError>;
}
