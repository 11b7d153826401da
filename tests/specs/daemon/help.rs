//! rotad help and version specs

use crate::prelude::*;
use assert_cmd::Command;

fn rotad() -> Command {
    let mut cmd = Command::new(rotad_binary());
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn rotad_help_documents_environment() {
    let assert = rotad().arg("--help").assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(stdout.contains("USAGE:"), "{stdout}");
    assert!(stdout.contains("ROTA_STATE_DIR"), "{stdout}");
    assert!(stdout.contains("ROTA_TICK_SECS"), "{stdout}");
    assert!(stdout.contains("ROTA_WINDOW"), "{stdout}");
}

#[test]
fn rotad_version() {
    let assert = rotad().arg("--version").assert().success();
    assert!(String::from_utf8_lossy(&assert.get_output().stdout).starts_with("rotad 0.1"));
}

#[test]
fn rotad_rejects_unknown_arguments() {
    let assert = rotad().arg("--fast").assert().code(1);
    assert!(String::from_utf8_lossy(&assert.get_output().stderr).contains("unexpected argument"));
}
