//! Test helpers for behavioral specifications.
//!
//! Provides a small DSL for driving the `rota` and `rotad` binaries against
//! an isolated state directory.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};

// Spec polling timeouts
pub const SPEC_POLL_INTERVAL_MS: u64 = 10;
pub const SPEC_WAIT_MAX_MS: u64 = 5000;

/// Returns the path to a binary, checking the llvm-cov target directory first.
///
/// Falls back to resolving relative to the test binary itself when
/// CARGO_MANIFEST_DIR points at a different target directory.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    // The test binary lives at target/debug/deps/specs-<hash>
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

pub fn rota_binary() -> PathBuf {
    binary_path("rota")
}

pub fn rotad_binary() -> PathBuf {
    binary_path("rotad")
}

/// Create a CLI builder for rota commands
pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

/// High-level CLI builder for fluent test assertions
pub struct CliBuilder {
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            envs: vec![("NO_COLOR".into(), "1".into())],
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<Path>) -> Self {
        self.envs.push((
            key.to_string(),
            value.as_ref().to_string_lossy().to_string(),
        ));
        self
    }

    /// Build the command without running it
    pub fn command(self) -> Command {
        let mut cmd = Command::new(rota_binary());
        cmd.args(&self.args);

        // Keep the caller's state and overrides out of the test
        for var in ["ROTA_STATE_DIR", "ROTA_TICK_SECS", "ROTA_WINDOW", "COLOR"] {
            cmd.env_remove(var);
        }
        for (key, value) in self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    /// Run and expect success (exit code 0)
    pub fn passes(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    /// Run and expect failure (non-zero exit code)
    pub fn fails(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

/// Result of a CLI run for chaining assertions
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn code(&self) -> Option<i32> {
        self.output.status.code()
    }

    /// Parse stdout as JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.output.stdout).unwrap_or_else(|e| {
            panic!("stdout is not JSON ({e}):\n{}", self.stdout());
        })
    }

    /// Assert stdout equals expected exactly (with diff on failure).
    pub fn stdout_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.stdout(), expected);
        self
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout does not contain '{}'\nstdout: {}",
            expected,
            stdout
        );
        self
    }

    pub fn stdout_lacks(self, unexpected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            !stdout.contains(unexpected),
            "stdout should not contain '{}'\nstdout: {}",
            unexpected,
            stdout
        );
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(expected),
            "stderr does not contain '{}'\nstderr: {}",
            expected,
            stderr
        );
        self
    }
}

// =============================================================================
// Polling
// =============================================================================

/// Poll a condition until it returns true or the timeout is reached.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);
    let poll_interval = std::time::Duration::from_millis(SPEC_POLL_INTERVAL_MS);

    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll_interval);
    }
    false
}

// =============================================================================
// Workspace
// =============================================================================

/// Isolated state directory plus a scratch directory for task targets.
pub struct Workspace {
    state_dir: tempfile::TempDir,
    jobs_dir: tempfile::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            state_dir: tempfile::tempdir().unwrap(),
            jobs_dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn state_path(&self) -> &Path {
        self.state_dir.path()
    }

    /// Run rota against this workspace's state
    pub fn rota(&self) -> CliBuilder {
        cli().env("ROTA_STATE_DIR", self.state_path())
    }

    /// Write `<state>/config.toml`
    pub fn config(&self, text: &str) {
        std::fs::write(self.state_path().join("config.toml"), text).unwrap();
    }

    /// Write an executable shell script under the jobs directory.
    ///
    /// Names ending in `.exe` are launched directly, so a shebang script
    /// stands in for a native program.
    #[cfg(unix)]
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.jobs_dir.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Register a task and return its ID.
    pub fn add_task(&self, name: &str, target: &Path, extra: &[&str]) -> String {
        let target = target.to_string_lossy();
        let mut args = vec!["task", "add", name, "--target", target.as_ref()];
        args.extend_from_slice(extra);
        let out = self.rota().args(&args).args(&["-o", "json"]).passes();
        out.json()["id"].as_str().unwrap().to_string()
    }

    /// Parsed lines of the execution log
    pub fn executions(&self) -> Vec<serde_json::Value> {
        let path = self.state_path().join("logs/executions.jsonl");
        std::fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    pub fn task_log(&self, id: &str) -> String {
        let path = self.state_path().join(format!("logs/task/{id}.log"));
        std::fs::read_to_string(path).unwrap_or_default()
    }

    /// Start rotad in the background against this workspace.
    pub fn start_daemon(&self, envs: &[(&str, &str)]) -> DaemonProcess {
        let mut cmd = Command::new(rotad_binary());
        cmd.env("ROTA_STATE_DIR", self.state_path())
            .env_remove("ROTA_TICK_SECS")
            .env_remove("ROTA_WINDOW")
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        for (key, value) in envs {
            cmd.env(key, value);
        }
        DaemonProcess {
            child: cmd.spawn().expect("rotad should start"),
        }
    }

    pub fn pid_path(&self) -> PathBuf {
        self.state_path().join("rotad.pid")
    }

    pub fn daemon_log(&self) -> String {
        std::fs::read_to_string(self.state_path().join("rotad.log"))
            .unwrap_or_else(|_| "(no daemon log)".to_string())
    }
}

/// A running rotad; killed on drop if still alive.
pub struct DaemonProcess {
    child: Child,
}

impl DaemonProcess {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Send SIGTERM and wait for the process to exit.
    pub fn terminate(mut self) -> std::process::ExitStatus {
        Command::new("kill")
            .args(["-TERM", &self.pid().to_string()])
            .status()
            .expect("kill should run");
        self.child.wait().expect("rotad should exit")
    }
}

impl Drop for DaemonProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
