// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rota logs`: execution records for a period

use std::io::Write;

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use clap::Args;
use rota_core::{format_duration, Calendar, Clock, ExecutionRecord, LocalCalendar, SystemClock};
use rota_storage::ExecutionLog;

use crate::output::{first_line, local_time, print_json, OutputFormat};
use crate::table::{Column, Table};

#[derive(Args)]
pub struct LogsArgs {
    /// Period start: YYYY-MM-DD or "YYYY-MM-DD HH:MM[:SS]" (default: today)
    #[arg(long)]
    pub since: Option<String>,
    /// Period end, exclusive (default: the day after --since)
    #[arg(long)]
    pub until: Option<String>,
    /// Only records for this task ID (or ID prefix)
    #[arg(long)]
    pub task: Option<String>,
}

/// Parse a local date or date-time into an instant.
pub fn parse_instant(text: &str, calendar: &impl Calendar) -> Result<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return day_start(date, calendar);
    }
    let normalized = text.replacen('T', " ", 1);
    let parsed = NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M"))
        .map_err(|_| anyhow!("invalid date '{}': expected YYYY-MM-DD [HH:MM[:SS]]", text))?;
    calendar
        .resolve(parsed.date(), parsed.time())
        .ok_or_else(|| anyhow!("'{}' does not exist in the local time zone", text))
}

/// Resolve the `[since, until)` period; `today` anchors the defaults.
pub fn period(
    since: Option<&str>,
    until: Option<&str>,
    today: NaiveDate,
    calendar: &impl Calendar,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = match since {
        Some(text) => parse_instant(text, calendar)?,
        None => day_start(today, calendar)?,
    };
    let end = match until {
        Some(text) => parse_instant(text, calendar)?,
        None => {
            let next = calendar
                .date_of(start)
                .checked_add_days(Days::new(1))
                .ok_or_else(|| anyhow!("date out of range"))?;
            day_start(next, calendar)?
        }
    };
    if start >= end {
        bail!("--since must be before --until");
    }
    Ok((start, end))
}

fn day_start(date: NaiveDate, calendar: &impl Calendar) -> Result<DateTime<Utc>> {
    // Midnight can be skipped by DST in some zones; take the first minute that exists
    (0..=120)
        .filter_map(|m| NaiveTime::from_hms_opt(m / 60, m % 60, 0))
        .find_map(|time| calendar.resolve(date, time))
        .ok_or_else(|| anyhow!("no local midnight on {}", date))
}

pub fn render(records: &[ExecutionRecord], table: &mut Table, out: &mut impl Write) {
    for record in records {
        let output = if record.exit_status.is_success() {
            first_line(&record.stdout)
        } else {
            match first_line(&record.stderr) {
                "" => first_line(&record.stdout),
                line => line,
            }
        };
        table.row(vec![
            local_time(record.started_at),
            record.task_name.clone(),
            record.exit_status.to_string(),
            format_duration(record.elapsed()),
            output.to_string(),
        ]);
    }
    table.render(out);
}

pub fn handle(args: LogsArgs, log: &ExecutionLog, format: OutputFormat) -> Result<()> {
    let calendar = LocalCalendar;
    let today = calendar.date_of(SystemClock.now());
    let (start, end) = period(
        args.since.as_deref(),
        args.until.as_deref(),
        today,
        &calendar,
    )?;

    let mut records = log.records_between(start, end)?;
    if let Some(query) = args.task.as_deref() {
        records.retain(|r| r.task_id.as_str().starts_with(query));
    }

    match format {
        OutputFormat::Text if records.is_empty() => println!("No executions in this period"),
        OutputFormat::Text => {
            let mut table = Table::new(vec![
                Column::left("STARTED"),
                Column::left("TASK").with_max(32),
                Column::status("STATUS"),
                Column::right("TOOK"),
                Column::muted("OUTPUT").with_max(60),
            ]);
            render(&records, &mut table, &mut std::io::stdout());
        }
        OutputFormat::Json => print_json(&records)?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "logs_tests.rs"]
mod tests;
