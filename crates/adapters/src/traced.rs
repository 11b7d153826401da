// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrapper for consistent observability

use crate::launch::{LaunchError, Launcher};
use async_trait::async_trait;
use rota_core::{ExitStatus, LaunchSpec, OutputLine};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Wrapper that adds tracing to any Launcher
#[derive(Clone)]
pub struct TracedLauncher<L> {
    inner: L,
}

impl<L> TracedLauncher<L> {
    pub fn new(inner: L) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

#[async_trait]
impl<L: Launcher> Launcher for TracedLauncher<L> {
    async fn launch(
        &self,
        spec: &LaunchSpec,
        output: mpsc::Sender<OutputLine>,
        cancel: CancellationToken,
    ) -> Result<ExitStatus, LaunchError> {
        let span = tracing::info_span!(
            "launch",
            program = %spec.program,
            cwd = ?spec.working_dir,
            cancellable = spec.cancellable,
        );
        async {
            tracing::info!(command = %spec.command_line(), "starting");
            let start = std::time::Instant::now();
            let result = self.inner.launch(spec, output, cancel).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(status) => tracing::info!(elapsed_ms, %status, "process finished"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "launch failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
