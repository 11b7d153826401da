// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mapping a task's target to a concrete process invocation.
//!
//! A target is an entry path optionally followed by arguments. The entry's
//! shape is resolved once into a [`TargetKind`], in this order: robot
//! runner, script (`.py`/`.pyw`), batch (`.bat`/`.cmd`), shell script
//! (`.ps1`), shortcut (`.lnk`), native executable (`.exe`/`.com`).
//! Anything else is rejected.
//!
//! Paths are handled as text with both `/` and `\` separators so that the
//! mapping is identical on every host.

use rota_core::{LaunchSpec, TaskDefinition, Tool};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const ROBOT_EXECUTABLES: &[&str] = &["robot.exe", "uirobot.exe"];

/// Errors building a launch spec
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("unsupported target '{target}': {reason}")]
    UnsupportedTarget { target: String, reason: String },
}

/// Programs used to run interpreted targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    pub script_interpreter: String,
    pub command_shell: String,
    pub shell_interpreter: String,
    /// Pause after a robot run so the runner can release the desktop session
    pub robot_settle: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            script_interpreter: "python".to_string(),
            command_shell: "cmd.exe".to_string(),
            shell_interpreter: "powershell".to_string(),
            robot_settle: Duration::from_secs(20),
        }
    }
}

/// Launch mechanism for a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Robot,
    Script,
    Batch,
    ShellScript,
    Shortcut,
    Native,
}

impl TargetKind {
    /// Classify an entry path.
    pub fn resolve(tool: Tool, entry: &str) -> Result<Self, DispatchError> {
        if tool == Tool::Robot || is_robot(entry) {
            return Ok(TargetKind::Robot);
        }
        let ext = extension(entry);
        match ext.as_deref() {
            Some("py" | "pyw") => Ok(TargetKind::Script),
            Some("bat" | "cmd") => Ok(TargetKind::Batch),
            Some("ps1") => Ok(TargetKind::ShellScript),
            Some("lnk") => Ok(TargetKind::Shortcut),
            Some("exe" | "com") => Ok(TargetKind::Native),
            Some(other) => Err(DispatchError::UnsupportedTarget {
                target: entry.to_string(),
                reason: format!("'.{}' is not an executable file type", other),
            }),
            None => Err(DispatchError::UnsupportedTarget {
                target: entry.to_string(),
                reason: "target has no file extension".to_string(),
            }),
        }
    }

    /// Only a directly owned interpreter process can be terminated safely.
    pub fn cancellable(&self) -> bool {
        matches!(self, TargetKind::Script)
    }
}

/// Build the invocation for `task`, probing the filesystem to split the target.
pub fn build_launch_spec(
    task: &TaskDefinition,
    config: &DispatchConfig,
) -> Result<LaunchSpec, DispatchError> {
    build_with_probe(task, config, &|p| Path::new(p).exists())
}

pub(crate) fn build_with_probe(
    task: &TaskDefinition,
    config: &DispatchConfig,
    exists: &dyn Fn(&str) -> bool,
) -> Result<LaunchSpec, DispatchError> {
    let whole = unquote(task.target.trim());
    if whole.is_empty() {
        return Err(DispatchError::UnsupportedTarget {
            target: task.target.clone(),
            reason: "target is empty".to_string(),
        });
    }

    // The robot runner path is taken verbatim; trailing text is not split off
    if task.tool == Tool::Robot || is_robot(whole) {
        return Ok(robot_spec(whole, task, config));
    }

    let (entry, rest) = split_target(&task.target, exists);
    let kind = TargetKind::resolve(task.tool, &entry)?;
    let spec = match kind {
        TargetKind::Robot => return Ok(robot_spec(&entry, task, config)),
        TargetKind::Script => LaunchSpec::new(&config.script_interpreter)
            .arg(&entry)
            .args(rest),
        TargetKind::Batch => LaunchSpec::new(&config.command_shell)
            .args(["/c", entry.as_str()])
            .args(rest),
        TargetKind::ShellScript => LaunchSpec::new(&config.shell_interpreter)
            .args(BYPASS)
            .args(["-File", entry.as_str()])
            .args(rest),
        TargetKind::Shortcut => {
            let arg_list = rest.iter().map(|a| ps_quote(a)).collect::<Vec<_>>();
            let command = format!(
                "Start-Process -FilePath {} -ArgumentList @({}) -Wait",
                ps_quote(&entry),
                arg_list.join(",")
            );
            LaunchSpec::new(&config.shell_interpreter)
                .args(BYPASS)
                .args(["-Command".to_string(), command])
        }
        TargetKind::Native => LaunchSpec::new(&entry).args(rest),
    };

    Ok(spec
        .working_dir(parent_dir(&entry))
        .cancellable(kind.cancellable()))
}

const BYPASS: [&str; 3] = ["-NoProfile", "-ExecutionPolicy", "Bypass"];

fn robot_spec(runner: &str, task: &TaskDefinition, config: &DispatchConfig) -> LaunchSpec {
    LaunchSpec::new(runner)
        .args(["execute", "--process-name", task.name.as_str()])
        .working_dir(parent_dir(runner))
        .settle(config.robot_settle)
}

/// Separate the entry path from trailing arguments.
///
/// The whole target wins if it exists. Otherwise the longest run of leading
/// tokens that names an existing path is the entry; failing that, the first
/// token. A quoted first token is always the entry on its own.
pub fn split_target(target: &str, exists: &dyn Fn(&str) -> bool) -> (String, Vec<String>) {
    let target = target.trim();
    let unquoted = unquote(target);
    if exists(unquoted) {
        return (unquoted.to_string(), Vec::new());
    }

    let (tokens, first_quoted) = tokenize(target);
    if tokens.is_empty() {
        return (String::new(), Vec::new());
    }
    if !first_quoted {
        for n in (1..=tokens.len()).rev() {
            let candidate = tokens[..n].join(" ");
            if exists(&candidate) {
                return (candidate, tokens[n..].to_vec());
            }
        }
    }
    let mut tokens = tokens.into_iter();
    let entry = tokens.next().unwrap_or_default();
    (entry, tokens.collect())
}

/// Whitespace-separated tokens; double quotes group and are removed.
fn tokenize(text: &str) -> (Vec<String>, bool) {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;
    let mut first_quoted = false;

    for c in text.chars() {
        match c {
            '"' => {
                if tokens.is_empty() && !has_token {
                    first_quoted = true;
                }
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        tokens.push(current);
    }
    (tokens, first_quoted)
}

fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .filter(|t| !t.contains('"'))
        .unwrap_or(text)
}

/// PowerShell single-quoted literal
fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn extension(path: &str) -> Option<String> {
    let name = file_name(path);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext.to_lowercase()),
        _ => None,
    }
}

fn is_robot(path: &str) -> bool {
    let name = file_name(path).to_lowercase();
    ROBOT_EXECUTABLES.contains(&name.as_str())
}

fn parent_dir(path: &str) -> Option<PathBuf> {
    let idx = path.rfind(['/', '\\'])?;
    let parent = &path[..idx];
    if parent.is_empty() {
        // Entry directly under the root
        return Some(PathBuf::from(&path[..=idx]));
    }
    if parent.ends_with(':') {
        // Drive root such as `C:`
        return Some(PathBuf::from(&path[..=idx]));
    }
    Some(PathBuf::from(parent))
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
