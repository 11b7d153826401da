// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task catalog commands

use std::io::Write;

use anyhow::{bail, Result};
use clap::{Args, Subcommand, ValueEnum};
use rota_core::{IdGen, RuleText, ScheduleRule, TaskDefinition, Tool, UuidIdGen};
use rota_storage::CatalogFile;

use crate::color;
use crate::commands::resolve::resolve_task;
use crate::output::{print_json, OutputFormat};
use crate::table::{Column, Table};

#[derive(Args)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommand,
}

#[derive(Subcommand)]
pub enum TaskCommand {
    /// Register a new task
    Add {
        /// Display name; for robot tasks, the process to execute
        name: String,
        /// Entry path, optionally followed by arguments
        #[arg(long)]
        target: String,
        /// Explicit task ID (default: generated)
        #[arg(long)]
        id: Option<String>,
        /// Launch mechanism
        #[arg(long, value_enum, default_value_t)]
        tool: ToolArg,
        #[command(flatten)]
        rule: RuleArgs,
        /// Register the task disabled
        #[arg(long)]
        disabled: bool,
    },
    /// List registered tasks
    List,
    /// Show one task
    Show {
        /// Task ID or unique prefix
        id: String,
    },
    /// Change fields of an existing task
    Edit {
        /// Task ID or unique prefix
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        target: Option<String>,
        #[arg(long, value_enum)]
        tool: Option<ToolArg>,
        #[command(flatten)]
        rule: RuleArgs,
    },
    /// Remove a task
    Rm {
        /// Task ID or unique prefix
        id: String,
    },
    /// Enable a task
    Enable {
        /// Task ID or unique prefix
        id: String,
    },
    /// Disable a task (it stays in the catalog but never fires)
    Disable {
        /// Task ID or unique prefix
        id: String,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum ToolArg {
    #[default]
    Auto,
    Robot,
}

impl From<ToolArg> for Tool {
    fn from(arg: ToolArg) -> Self {
        match arg {
            ToolArg::Auto => Tool::Auto,
            ToolArg::Robot => Tool::Robot,
        }
    }
}

/// Schedule fields; each takes a list like `1,3-5`, names, or `*`.
///
/// Omitted fields are wildcards on `add` and unchanged on `edit`.
#[derive(Args, Debug, Default, Clone)]
pub struct RuleArgs {
    #[arg(long)]
    pub years: Option<String>,
    #[arg(long)]
    pub months: Option<String>,
    /// Weeks of the month (1-5)
    #[arg(long)]
    pub weeks: Option<String>,
    /// Weekdays (1=Monday .. 7=Sunday, or names)
    #[arg(long)]
    pub weekdays: Option<String>,
    /// Days of the month
    #[arg(long)]
    pub days: Option<String>,
    #[arg(long)]
    pub hours: Option<String>,
    #[arg(long)]
    pub minutes: Option<String>,
}

impl RuleArgs {
    fn is_empty(&self) -> bool {
        [
            &self.years,
            &self.months,
            &self.weeks,
            &self.weekdays,
            &self.days,
            &self.hours,
            &self.minutes,
        ]
        .iter()
        .all(|f| f.is_none())
    }

    /// Overlay the given fields onto `base` and parse the result.
    pub fn apply(&self, base: RuleText) -> Result<ScheduleRule> {
        let pick = |given: &Option<String>, current: String| given.clone().unwrap_or(current);
        let text = RuleText {
            years: pick(&self.years, base.years),
            months: pick(&self.months, base.months),
            weeks_of_month: pick(&self.weeks, base.weeks_of_month),
            weekdays: pick(&self.weekdays, base.weekdays),
            days: pick(&self.days, base.days),
            hours: pick(&self.hours, base.hours),
            minutes: pick(&self.minutes, base.minutes),
        };
        Ok(ScheduleRule::parse(&text)?)
    }
}

/// Fields accepted by [`add_task`].
pub struct NewTask {
    pub name: String,
    pub target: String,
    pub id: Option<String>,
    pub tool: Tool,
    pub rule: RuleArgs,
    pub enabled: bool,
}

pub fn add_task(catalog: &CatalogFile, ids: &impl IdGen, new: NewTask) -> Result<TaskDefinition> {
    let name = non_blank("name", new.name)?;
    let target = non_blank("target", new.target)?;
    let id = match new.id {
        Some(id) => non_blank("id", id)?,
        None => ids.next(),
    };
    let schedule = new.rule.apply(RuleText::default())?;

    let task = TaskDefinition::new(id, name, target)
        .tool(new.tool)
        .schedule(schedule)
        .enabled(new.enabled);
    catalog.add(task.clone())?;
    Ok(task)
}

/// Changes accepted by [`edit_task`].
#[derive(Default)]
pub struct TaskEdit {
    pub name: Option<String>,
    pub target: Option<String>,
    pub tool: Option<Tool>,
    pub rule: RuleArgs,
}

pub fn edit_task(catalog: &CatalogFile, query: &str, edit: TaskEdit) -> Result<TaskDefinition> {
    let mut task = resolve_task(&catalog.list()?, query)?;
    if edit.name.is_none() && edit.target.is_none() && edit.tool.is_none() && edit.rule.is_empty()
    {
        bail!("nothing to change; pass at least one field to edit");
    }

    if let Some(name) = edit.name {
        task.name = non_blank("name", name)?;
    }
    if let Some(target) = edit.target {
        task.target = non_blank("target", target)?;
    }
    if let Some(tool) = edit.tool {
        task.tool = tool;
    }
    task.schedule = edit.rule.apply(task.schedule.to_text())?;
    catalog.update(task.clone())?;
    Ok(task)
}

fn non_blank(what: &str, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("task {} must not be empty", what);
    }
    Ok(trimmed.to_string())
}

pub fn render_list(tasks: &[TaskDefinition], table: &mut Table, out: &mut impl Write) {
    for task in tasks {
        table.row(vec![
            task.id.short(8).to_string(),
            task.name.clone(),
            task.tool.to_string(),
            task.schedule.to_string(),
            if task.enabled { "enabled" } else { "disabled" }.to_string(),
            task.target.clone(),
        ]);
    }
    table.render(out);
}

fn list_columns() -> Vec<Column> {
    vec![
        Column::muted("ID"),
        Column::left("NAME").with_max(32),
        Column::left("TOOL"),
        Column::left("SCHEDULE"),
        Column::status("ENABLED"),
        Column::left("TARGET"),
    ]
}

fn print_task(task: &TaskDefinition) {
    let label = |s: &str| color::header(&format!("{s:<9}"));
    println!("{}{}", label("ID"), task.id);
    println!("{}{}", label("Name"), task.name);
    println!("{}{}", label("Target"), task.target);
    println!("{}{}", label("Tool"), task.tool);
    println!(
        "{}{}  {}",
        label("Schedule"),
        task.schedule,
        color::context("(years months weeks weekdays days hours minutes)")
    );
    let enabled = if task.enabled { "enabled" } else { "disabled" };
    println!("{}{}", label("Status"), color::status(enabled));
}

pub fn handle(command: TaskCommand, catalog: &CatalogFile, format: OutputFormat) -> Result<()> {
    match command {
        TaskCommand::Add {
            name,
            target,
            id,
            tool,
            rule,
            disabled,
        } => {
            let new = NewTask {
                name,
                target,
                id,
                tool: tool.into(),
                rule,
                enabled: !disabled,
            };
            let task = add_task(catalog, &UuidIdGen, new)?;
            match format {
                OutputFormat::Text => println!("Task '{}' added ({})", task.name, task.id),
                OutputFormat::Json => print_json(&task)?,
            }
        }
        TaskCommand::List => {
            let tasks = catalog.list()?;
            match format {
                OutputFormat::Text if tasks.is_empty() => println!("No tasks registered"),
                OutputFormat::Text => {
                    let mut table = Table::new(list_columns());
                    render_list(&tasks, &mut table, &mut std::io::stdout());
                }
                OutputFormat::Json => print_json(&tasks)?,
            }
        }
        TaskCommand::Show { id } => {
            let task = resolve_task(&catalog.list()?, &id)?;
            match format {
                OutputFormat::Text => print_task(&task),
                OutputFormat::Json => print_json(&task)?,
            }
        }
        TaskCommand::Edit {
            id,
            name,
            target,
            tool,
            rule,
        } => {
            let edit = TaskEdit {
                name,
                target,
                tool: tool.map(Tool::from),
                rule,
            };
            let task = edit_task(catalog, &id, edit)?;
            match format {
                OutputFormat::Text => println!("Task '{}' updated", task.name),
                OutputFormat::Json => print_json(&task)?,
            }
        }
        TaskCommand::Rm { id } => {
            let task = resolve_task(&catalog.list()?, &id)?;
            let removed = catalog.remove(&task.id)?;
            match format {
                OutputFormat::Text => println!("Task '{}' removed", removed.name),
                OutputFormat::Json => print_json(&removed)?,
            }
        }
        TaskCommand::Enable { id } => set_enabled(catalog, &id, true, format)?,
        TaskCommand::Disable { id } => set_enabled(catalog, &id, false, format)?,
    }
    Ok(())
}

fn set_enabled(catalog: &CatalogFile, query: &str, enabled: bool, format: OutputFormat) -> Result<()> {
    let mut task = resolve_task(&catalog.list()?, query)?;
    catalog.set_enabled(&task.id, enabled)?;
    task.enabled = enabled;
    match format {
        OutputFormat::Text => {
            let state = if enabled { "enabled" } else { "disabled" };
            println!("Task '{}' {}", task.name, color::status(state));
        }
        OutputFormat::Json => print_json(&task)?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
