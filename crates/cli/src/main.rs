// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rota - run automation tasks on a schedule

#[cfg(unix)]
mod client;
mod color;
mod commands;
mod env;
mod exit_error;
mod output;
mod table;

use output::OutputFormat;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use commands::{agenda, cancel, logs, run, task};
use rota_daemon::Config;
use rota_storage::{CatalogFile, ExecutionLog};

#[derive(Parser)]
#[command(
    name = "rota",
    version,
    about = "Rota - run automation tasks on a schedule",
    styles = color::styles()
)]
struct Cli {
    /// Output format
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value_t,
        global = true
    )]
    output: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the task catalog
    Task(task::TaskArgs),
    /// Show which tasks fire when on a day
    Agenda(agenda::AgendaArgs),
    /// Show execution records for a period
    Logs(logs::LogsArgs),
    /// Run a task now, in the foreground
    Run(run::RunArgs),
    /// Stop the execution rotad is running
    Cancel,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let code = e
            .downcast_ref::<exit_error::ExitError>()
            .map_or(1, |c| c.code);
        let msg = format_error(&e);
        if !msg.is_empty() {
            eprintln!("Error: {}", msg);
        }
        std::process::exit(code);
    }
}

/// Format an anyhow error, deduplicating the chain.
///
/// If the top-level Display already contains the source error text, we skip
/// the "Caused by" section.
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();

    let chain_redundant = err
        .chain()
        .skip(1)
        .all(|cause| top.contains(&cause.to_string()));

    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {}: {}", i, cause));
    }
    buf
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.output;

    let Some(command) = cli.command else {
        // No subcommand provided: print help and exit 0
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load()?;
    let catalog = CatalogFile::new(config.catalog_path.clone());

    match command {
        Commands::Task(args) => task::handle(args.command, &catalog, format),
        Commands::Agenda(args) => {
            agenda::handle(args, &catalog, &config.scheduler.window, format)
        }
        Commands::Logs(args) => {
            let log = ExecutionLog::new(config.execution_log_path.clone());
            logs::handle(args, &log, format)
        }
        Commands::Run(args) => run::handle(args, &config, format).await,
        Commands::Cancel => cancel::handle(&config, format).await,
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
