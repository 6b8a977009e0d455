// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task verbs: create, list, show, update, close, reopen, ready, dep, epic.

use crate::client::Context;
use crate::exit_error::ExitError;
use crate::output::{cell, format_time_ago, print_json};
use crate::table::{Column, Table};
use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::Value;
use squad_core::{IssueType, Priority, TaskId, TaskPatch, TaskStatus};
use squad_storage::{TaskFilter, TaskSpec};
use std::collections::BTreeSet;

fn parse_id(raw: &str) -> Result<TaskId> {
    TaskId::validate(raw).map_err(|e| ExitError::user(e.to_string()).into())
}

fn parse_priority(raw: u8) -> Result<Priority> {
    Priority::new(raw).map_err(|e| ExitError::user(e.to_string()).into())
}

#[derive(Args)]
pub struct CreateArgs {
    /// Task title
    pub title: String,
    /// Issue type: bug | feature | task | chore | epic | chat
    #[arg(long = "type", default_value = "task")]
    pub issue_type: IssueType,
    /// Priority 0..=4 (0 is most urgent)
    #[arg(long, short = 'p', default_value_t = 2)]
    pub priority: u8,
    /// Parent task id (children get `<parent>.<n>` ids)
    #[arg(long)]
    pub parent: Option<String>,
    /// Dependencies (repeatable)
    #[arg(long = "depends-on")]
    pub depends_on: Vec<String>,
    /// Longer description
    #[arg(long, default_value = "")]
    pub description: String,
    /// Free-form notes
    #[arg(long, default_value = "")]
    pub notes: String,
    /// Labels (repeatable)
    #[arg(long = "label")]
    pub labels: Vec<String>,
}

pub async fn create(ctx: &Context, args: CreateArgs) -> Result<()> {
    let parent = args.parent.as_deref().map(parse_id).transpose()?;
    let mut depends_on = BTreeSet::new();
    for dep in &args.depends_on {
        depends_on.insert(parse_id(dep)?);
    }
    let spec = TaskSpec {
        title: args.title,
        description: args.description,
        notes: args.notes,
        issue_type: Some(args.issue_type),
        priority: Some(parse_priority(args.priority)?),
        parent,
        parent_index: None,
        depends_on,
        labels: args.labels.into_iter().collect(),
    };
    let task = ctx.task_create(spec).await?;
    if ctx.output.is_json() {
        print_json(&task);
    } else {
        println!("{}", cell(&task, "id"));
    }
    Ok(())
}

#[derive(Args)]
pub struct ListArgs {
    /// Filter by status
    #[arg(long)]
    pub status: Option<TaskStatus>,
    /// Filter by issue type
    #[arg(long = "type")]
    pub issue_type: Option<IssueType>,
    /// Filter by assignee
    #[arg(long)]
    pub assignee: Option<String>,
    /// Filter by label
    #[arg(long)]
    pub label: Option<String>,
}

pub async fn list(ctx: &Context, args: ListArgs) -> Result<()> {
    let filter = TaskFilter {
        status: args.status,
        issue_type: args.issue_type,
        assignee: args.assignee,
        label: args.label,
        parent: None,
    };
    let tasks = ctx.task_list(&filter).await?;
    render_task_list(ctx, &tasks);
    Ok(())
}

pub async fn ready(ctx: &Context) -> Result<()> {
    let tasks = ctx.task_ready().await?;
    render_task_list(ctx, &tasks);
    Ok(())
}

fn render_task_list(ctx: &Context, tasks: &Value) {
    if ctx.output.is_json() {
        print_json(tasks);
        return;
    }
    let empty = Vec::new();
    let rows = tasks.as_array().unwrap_or(&empty);
    if rows.is_empty() {
        println!("No tasks");
        return;
    }
    let mut table = Table::new(vec![
        Column::left("ID"),
        Column::status("STATUS"),
        Column::left("TYPE"),
        Column::right("PRI"),
        Column::left("ASSIGNEE"),
        Column::muted("AGE"),
        Column::left("TITLE").with_max(60),
    ]);
    for task in rows {
        table.row(vec![
            cell(task, "id"),
            cell(task, "status"),
            cell(task, "issue_type"),
            cell(task, "priority"),
            cell(task, "assignee"),
            format_time_ago(task["created_at_ms"].as_u64().unwrap_or(0)),
            cell(task, "title"),
        ]);
    }
    table.render(&mut std::io::stdout());
}

pub async fn show(ctx: &Context, id: &str) -> Result<()> {
    let id = parse_id(id)?;
    let task = ctx.task_show(&id).await?;
    if ctx.output.is_json() {
        print_json(&task);
        return Ok(());
    }
    println!("{}  {}", cell(&task, "id"), cell(&task, "title"));
    println!("  status:    {}", cell(&task, "status"));
    println!("  type:      {}", cell(&task, "issue_type"));
    println!("  priority:  {}", cell(&task, "priority"));
    println!("  assignee:  {}", cell(&task, "assignee"));
    if !task["parent"].is_null() {
        println!("  parent:    {}", cell(&task, "parent"));
    }
    if let Some(deps) = task["depends_on"].as_array() {
        if !deps.is_empty() {
            let deps: Vec<&str> = deps.iter().filter_map(|d| d.as_str()).collect();
            println!("  depends:   {}", deps.join(", "));
        }
    }
    if let Some(labels) = task["labels"].as_array() {
        if !labels.is_empty() {
            let labels: Vec<&str> = labels.iter().filter_map(|l| l.as_str()).collect();
            println!("  labels:    {}", labels.join(", "));
        }
    }
    let description = task["description"].as_str().unwrap_or("");
    if !description.is_empty() {
        println!("\n{description}");
    }
    let notes = task["notes"].as_str().unwrap_or("");
    if !notes.is_empty() {
        println!("\nnotes: {notes}");
    }
    Ok(())
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Task id
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub status: Option<TaskStatus>,
    /// New assignee; empty string clears
    #[arg(long)]
    pub assignee: Option<String>,
    #[arg(long, short = 'p')]
    pub priority: Option<u8>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

pub async fn update(ctx: &Context, args: UpdateArgs) -> Result<()> {
    let id = parse_id(&args.id)?;
    let assignee = args.assignee.map(|a| if a.is_empty() { None } else { Some(a) });
    let patch = TaskPatch {
        title: args.title,
        description: args.description,
        notes: args.notes,
        issue_type: None,
        priority: args.priority.map(parse_priority).transpose()?,
        status: args.status,
        assignee,
        labels: None,
    };
    if patch.is_empty() {
        return Err(ExitError::user("nothing to update").into());
    }
    let task = ctx.task_update(&id, patch).await?;
    if ctx.output.is_json() {
        print_json(&task);
    } else {
        println!("{} {}", cell(&task, "id"), cell(&task, "status"));
    }
    Ok(())
}

pub async fn close(ctx: &Context, id: &str, override_deps: bool) -> Result<()> {
    let id = parse_id(id)?;
    let task = ctx.task_close(&id, override_deps).await?;
    if ctx.output.is_json() {
        print_json(&task);
    } else {
        println!("{} closed", cell(&task, "id"));
    }
    Ok(())
}

pub async fn reopen(ctx: &Context, id: &str) -> Result<()> {
    let id = parse_id(id)?;
    let task = ctx.task_reopen(&id).await?;
    if ctx.output.is_json() {
        print_json(&task);
    } else {
        println!("{} reopened", cell(&task, "id"));
    }
    Ok(())
}

#[derive(Args)]
pub struct DepArgs {
    #[command(subcommand)]
    pub command: DepCommand,
}

#[derive(Subcommand)]
pub enum DepCommand {
    /// Add a dependency: <task> depends on <on>
    Add { task: String, on: String },
    /// Remove a dependency edge
    Remove { task: String, on: String },
}

pub async fn dep(ctx: &Context, args: DepArgs) -> Result<()> {
    match args.command {
        DepCommand::Add { task, on } => {
            ctx.dep_add(&parse_id(&task)?, &parse_id(&on)?).await?;
            println!("{task} now depends on {on}");
        }
        DepCommand::Remove { task, on } => {
            ctx.dep_remove(&parse_id(&task)?, &parse_id(&on)?).await?;
            println!("{task} no longer depends on {on}");
        }
    }
    Ok(())
}

#[derive(Args)]
pub struct EpicArgs {
    #[command(subcommand)]
    pub command: EpicCommand,
}

#[derive(Subcommand)]
pub enum EpicCommand {
    /// Close every epic whose children are all closed
    CloseEligible,
    /// Show done/total counters for an epic
    Progress { id: String },
}

pub async fn epic(ctx: &Context, args: EpicArgs) -> Result<()> {
    match args.command {
        EpicCommand::CloseEligible => {
            let closed = ctx.epic_close_eligible().await?;
            if ctx.output.is_json() {
                print_json(&closed);
            } else {
                match closed.as_array().map(|a| a.len()).unwrap_or(0) {
                    0 => println!("No eligible epics"),
                    _ => {
                        for id in closed.as_array().into_iter().flatten() {
                            println!("{} closed", id.as_str().unwrap_or("?"));
                        }
                    }
                }
            }
        }
        EpicCommand::Progress { id } => {
            let progress = ctx.epic_progress(&parse_id(&id)?).await?;
            if ctx.output.is_json() {
                print_json(&progress);
            } else {
                println!(
                    "{}/{} children closed",
                    progress["done"].as_u64().unwrap_or(0),
                    progress["total"].as_u64().unwrap_or(0)
                );
            }
        }
    }
    Ok(())
}
