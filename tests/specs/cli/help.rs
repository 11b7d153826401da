//! CLI help output specs

use crate::prelude::*;

#[test]
fn rota_no_args_shows_usage_and_exits_zero() {
    cli().passes().stdout_has("Usage:");
}

#[test]
fn rota_help_lists_commands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("task")
        .stdout_has("agenda")
        .stdout_has("logs")
        .stdout_has("run")
        .stdout_has("cancel");
}

#[test]
fn rota_task_help_shows_subcommands() {
    cli()
        .args(&["task", "--help"])
        .passes()
        .stdout_has("add")
        .stdout_has("list")
        .stdout_has("edit")
        .stdout_has("rm")
        .stdout_has("enable")
        .stdout_has("disable");
}

#[test]
fn rota_task_add_help_shows_rule_flags() {
    cli()
        .args(&["task", "add", "--help"])
        .passes()
        .stdout_has("--weekdays")
        .stdout_has("--hours")
        .stdout_has("--minutes");
}

#[test]
fn rota_version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.1");
}
