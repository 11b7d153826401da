// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rota cancel`: stop the execution `rotad` is running

use anyhow::Result;
use rota_daemon::{instance_locked, Config, Response};

use crate::exit_error::ExitError;
use crate::output::{print_json, OutputFormat};

/// Text for an answered cancel; a rejection is an error.
pub fn outcome_text(response: &Response) -> Result<String, ExitError> {
    match response {
        Response::Cancelled { task_id } => Ok(format!("Cancelling {}", task_id.short(8))),
        Response::Idle => Ok("Nothing is running".to_string()),
        Response::CancelRejected { task_id, reason } => Err(ExitError::new(
            1,
            format!("cannot cancel {}: {}", task_id.short(8), reason),
        )),
        _ => Err(ExitError::new(1, "unexpected response from rotad")),
    }
}

pub async fn handle(config: &Config, format: OutputFormat) -> Result<()> {
    if !instance_locked(&config.lock_path)? {
        anyhow::bail!("rotad is not running");
    }
    let response = send_cancel(config).await?;

    match format {
        OutputFormat::Text => {
            println!("{}", outcome_text(&response)?);
        }
        OutputFormat::Json => {
            print_json(&response)?;
            if let Response::CancelRejected { .. } = response {
                return Err(ExitError::silent(1).into());
            }
        }
    }
    Ok(())
}

#[cfg(unix)]
async fn send_cancel(config: &Config) -> Result<Response> {
    let client = crate::client::DaemonClient::new(config.socket_path.clone());
    Ok(client.cancel().await?)
}

#[cfg(not(unix))]
async fn send_cancel(_config: &Config) -> Result<Response> {
    anyhow::bail!("talking to rotad needs a Unix socket")
}

#[cfg(test)]
#[path = "cancel_tests.rs"]
mod tests;
