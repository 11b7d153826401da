// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rota Daemon (rotad)
//!
//! Background process that evaluates the task catalog every tick and runs
//! due tasks one at a time.

use rota_daemon::{lifecycle, Config, LifecycleError};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config/lock acquisition
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("rotad {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("rotad {}", env!("CARGO_PKG_VERSION"));
                println!("Rota Daemon - runs scheduled tasks from the catalog one at a time");
                println!();
                println!("USAGE:");
                println!("    rotad");
                println!();
                println!("State lives in $ROTA_STATE_DIR, $XDG_STATE_HOME/rota or");
                println!("~/.local/state/rota. Manage tasks with the `rota` CLI;");
                println!("`rota run` and `rota cancel` talk to rotad over rotad.sock.");
                println!();
                println!("ENVIRONMENT:");
                println!("    ROTA_STATE_DIR    State directory");
                println!("    ROTA_TICK_SECS    Evaluation period in seconds (default 60)");
                println!("    ROTA_WINDOW       Active window, e.g. 07:00-18:00");
                println!("    RUST_LOG          Log filter (default info)");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: rotad [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;
    std::fs::create_dir_all(&config.state_dir)?;
    let _log_guard = setup_logging(&config)?;

    info!(
        window = %config.scheduler.window,
        tick_secs = config.scheduler.tick_period.as_secs(),
        "Starting daemon"
    );

    let daemon = match lifecycle::startup(&config).await {
        Ok(daemon) => daemon,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = std::fs::read_to_string(&config.lock_path)
                .unwrap_or_default()
                .trim()
                .to_string();
            eprintln!("rotad is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            std::process::exit(1);
        }
        Err(e) => {
            error!("Failed to start daemon: {}", e);
            return Err(e.into());
        }
    };

    let shutdown = CancellationToken::new();
    let run = tokio::spawn(daemon.run(shutdown.clone()));

    wait_for_signal().await?;
    shutdown.cancel();
    if let Err(e) = run.await {
        error!("Scheduler task failed: {}", e);
    }
    info!("Daemon stopped");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl-C, shutting down...");
    Ok(())
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let dir = config.log_path.parent().ok_or("log path has no parent")?;
    let file = config.log_path.file_name().ok_or("log path has no file name")?;
    let file_appender = tracing_appender::rolling::never(dir, file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
