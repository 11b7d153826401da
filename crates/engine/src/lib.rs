// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Rota scheduling engine

mod agenda;
mod dispatch;
mod error;
pub mod log_paths;
mod matcher;
mod queue;
mod scheduler;
mod task_logger;

pub use agenda::{agenda, AgendaEntry};
pub use dispatch::{build_launch_spec, split_target, DispatchConfig, DispatchError, TargetKind};
pub use error::SchedulerError;
pub use matcher::{is_due, matches};
pub use queue::{Drain, RunQueue};
pub use scheduler::{
    CancelOutcome, Scheduler, SchedulerConfig, SchedulerDeps, SchedulerState,
};
pub use task_logger::TaskLogger;
