// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `squad session` — inspect and drive live sessions.

use crate::client::Context;
use crate::output::{cell, format_time_ago, print_json};
use crate::table::{Column, Table};
use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::json;

#[derive(Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// List sessions
    List,
    /// Show one session
    Show { name: String },
    /// Pause: kill the terminal, keep the task for resume
    Pause { name: String },
    /// Resume a paused session
    Resume {
        name: String,
        /// Message injected as keystrokes after the terminal returns
        #[arg(short = 'm', long)]
        message: Option<String>,
    },
    /// Kill a session (terminal, reservations, record)
    Kill { name: String },
    /// Print the captured output tail
    Peek { name: String },
    /// Print the command to attach a viewer
    Attach { name: String },
}

pub async fn session(ctx: &Context, args: SessionArgs) -> Result<()> {
    match args.command {
        SessionCommand::List => {
            let sessions = ctx.get("/sessions").await?;
            if ctx.output.is_json() {
                print_json(&sessions);
                return Ok(());
            }
            let empty = Vec::new();
            let rows = sessions.as_array().unwrap_or(&empty);
            if rows.is_empty() {
                println!("No sessions");
                return Ok(());
            }
            let mut table = Table::new(vec![
                Column::left("SESSION"),
                Column::left("AGENT"),
                Column::status("STATE"),
                Column::left("TASK"),
                Column::muted("LAST SIGNAL"),
            ]);
            for record in rows {
                table.row(vec![
                    cell(record, "name"),
                    cell(record, "agent"),
                    cell(record, "state"),
                    cell(record, "task"),
                    format_time_ago(record["last_signal_at_ms"].as_u64().unwrap_or(0)),
                ]);
            }
            table.render(&mut std::io::stdout());
        }
        SessionCommand::Show { name } => {
            let record = ctx.get(&format!("/sessions/{name}")).await?;
            if ctx.output.is_json() {
                print_json(&record);
                return Ok(());
            }
            println!("{}  {}", cell(&record, "name"), cell(&record, "state"));
            println!("  agent: {}", cell(&record, "agent"));
            println!("  task:  {}", cell(&record, "task"));
            println!(
                "  last signal: {}",
                format_time_ago(record["last_signal_at_ms"].as_u64().unwrap_or(0))
            );
        }
        SessionCommand::Pause { name } => {
            let record = ctx
                .post(&format!("/sessions/{name}/pause"), json!({}))
                .await?;
            println!("{} paused", cell(&record, "name"));
        }
        SessionCommand::Resume { name, message } => {
            let record = ctx
                .post(
                    &format!("/sessions/{name}/resume"),
                    json!({"message": message}),
                )
                .await?;
            println!("{} resumed", cell(&record, "name"));
        }
        SessionCommand::Kill { name } => {
            ctx.request(reqwest::Method::DELETE, &format!("/sessions/{name}"), None)
                .await?;
            println!("{name} killed");
        }
        SessionCommand::Peek { name } => {
            let record = ctx.get(&format!("/sessions/{name}")).await?;
            if let Some(tail) = record["output_tail"]["lines"].as_array() {
                for line in tail {
                    println!("{}", line.as_str().unwrap_or(""));
                }
            }
        }
        SessionCommand::Attach { name } => {
            let hint = ctx
                .post(&format!("/sessions/{name}/attach"), json!({}))
                .await?;
            println!("{}", cell(&hint, "command"));
        }
    }
    Ok(())
}
