// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rota agenda`: what runs when on a given day

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use rota_core::{ActiveWindow, Calendar, Clock, LocalCalendar, SystemClock};
use rota_engine::{agenda, AgendaEntry};
use rota_storage::CatalogFile;

use crate::color;
use crate::output::{print_json, OutputFormat};
use crate::table::{Column, Table};

#[derive(Args)]
pub struct AgendaArgs {
    /// Day to show, YYYY-MM-DD (default: today)
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

pub fn render(entries: &[AgendaEntry], table: &mut Table, out: &mut impl Write) {
    for entry in entries {
        table.row(vec![
            entry.time.format("%H:%M").to_string(),
            entry.task_name.clone(),
            entry.task_id.short(8).to_string(),
        ]);
    }
    table.render(out);
}

pub fn handle(
    args: AgendaArgs,
    catalog: &CatalogFile,
    window: &ActiveWindow,
    format: OutputFormat,
) -> Result<()> {
    let calendar = LocalCalendar;
    let date = args
        .date
        .unwrap_or_else(|| calendar.date_of(SystemClock.now()));
    let entries = agenda(&catalog.list()?, date, &calendar, window);

    match format {
        OutputFormat::Text => {
            println!(
                "{}",
                color::context(&format!("{} (window {})", date.format("%a %Y-%m-%d"), window))
            );
            if entries.is_empty() {
                println!("Nothing scheduled");
                return Ok(());
            }
            let mut table = Table::new(vec![
                Column::left("TIME"),
                Column::left("TASK"),
                Column::muted("ID"),
            ]);
            render(&entries, &mut table, &mut std::io::stdout());
        }
        OutputFormat::Json => print_json(&entries)?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "agenda_tests.rs"]
mod tests;
