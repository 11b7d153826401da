// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: state paths plus scheduler settings.
//!
//! Settings come from `<state_dir>/config.toml` when present, then the
//! `ROTA_TICK_SECS` and `ROTA_WINDOW` environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rota_core::{ActiveWindow, WindowError};
use rota_engine::log_paths;
use rota_engine::{DispatchConfig, SchedulerConfig};
use serde::Deserialize;
use thiserror::Error;

use crate::env;

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("tick_secs must be at least 1")]
    ZeroTick,

    #[error(transparent)]
    Window(#[from] WindowError),
}

/// Optional settings file; every key may be omitted
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub tick_secs: Option<u64>,
    pub window: Option<ActiveWindow>,
    pub script_interpreter: Option<String>,
    pub command_shell: Option<String>,
    pub shell_interpreter: Option<String>,
    pub robot_settle_secs: Option<u64>,
}

impl FileConfig {
    /// Read `path`; a missing file yields the defaults.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply(self, scheduler: &mut SchedulerConfig) -> Result<(), ConfigError> {
        if let Some(secs) = self.tick_secs {
            if secs == 0 {
                return Err(ConfigError::ZeroTick);
            }
            scheduler.tick_period = Duration::from_secs(secs);
        }
        if let Some(window) = self.window {
            scheduler.window = window;
        }
        let dispatch: &mut DispatchConfig = &mut scheduler.dispatch;
        if let Some(program) = self.script_interpreter {
            dispatch.script_interpreter = program;
        }
        if let Some(program) = self.command_shell {
            dispatch.command_shell = program;
        }
        if let Some(program) = self.shell_interpreter {
            dispatch.shell_interpreter = program;
        }
        if let Some(secs) = self.robot_settle_secs {
            dispatch.robot_settle = Duration::from_secs(secs);
        }
        Ok(())
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/rota)
    pub state_dir: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to the control socket
    pub socket_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Path to the task catalog
    pub catalog_path: PathBuf,
    /// Directory for per-task logs and the execution log
    pub logs_path: PathBuf,
    /// Path to the execution record log
    pub execution_log_path: PathBuf,
    pub scheduler: SchedulerConfig,
}

impl Config {
    /// Resolve the state directory from the environment and load from it.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(env::state_dir()?)
    }

    /// Load settings from `state_dir`, applying environment overrides.
    pub fn load_from(state_dir: PathBuf) -> Result<Self, ConfigError> {
        let mut scheduler = SchedulerConfig::default();
        FileConfig::read(&state_dir.join(CONFIG_FILE))?.apply(&mut scheduler)?;

        if let Some(period) = env::tick_period() {
            scheduler.tick_period = period;
        }
        if let Some(window) = env::window() {
            scheduler.window = window.parse()?;
        }
        Ok(Self::new(state_dir, scheduler))
    }

    /// Paths under `state_dir` with explicit scheduler settings.
    pub fn new(state_dir: PathBuf, scheduler: SchedulerConfig) -> Self {
        let logs_path = state_dir.join("logs");
        Self {
            lock_path: state_dir.join("rotad.pid"),
            socket_path: state_dir.join("rotad.sock"),
            log_path: state_dir.join("rotad.log"),
            catalog_path: state_dir.join("catalog.json"),
            execution_log_path: log_paths::execution_log_path(&logs_path),
            logs_path,
            scheduler,
            state_dir,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
