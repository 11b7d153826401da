// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rota daemon library
//!
//! Exposes configuration, startup and the control protocol so the CLI
//! resolves the same state directory and settings as `rotad` and can talk
//! to a running instance.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod env;
pub mod event_log;
pub mod lifecycle;
#[cfg(unix)]
pub mod listener;
pub mod protocol;

pub use config::{Config, ConfigError, FileConfig, CONFIG_FILE};
pub use lifecycle::{
    instance_locked, startup, try_instance_lock, Daemon, DaemonScheduler, InstanceLock,
    LifecycleError,
};
pub use protocol::{ProtocolError, Request, Response};
