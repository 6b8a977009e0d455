// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `squad agent` — registry queries.

use crate::client::Context;
use crate::output::{cell, format_time_ago, print_json};
use crate::table::{Column, Table};
use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::Value;

#[derive(Args)]
pub struct AgentArgs {
    #[command(subcommand)]
    pub command: AgentCommand,
}

#[derive(Subcommand)]
pub enum AgentCommand {
    /// List every registered agent
    List,
    /// Agents active within a window, most recent first
    Recent {
        /// Window in minutes
        #[arg(long, default_value_t = 60)]
        minutes: u64,
    },
    /// Remove agents not seen within a window
    Purge {
        /// Window in days
        #[arg(long, default_value_t = 30)]
        days: u64,
    },
}

pub async fn agent(ctx: &Context, args: AgentArgs) -> Result<()> {
    let agents = match args.command {
        AgentCommand::List => ctx.get("/agents").await?,
        AgentCommand::Recent { minutes } => {
            ctx.get(&format!("/agents/recent?minutes={minutes}")).await?
        }
        AgentCommand::Purge { days } => {
            let result = ctx
                .post("/agents/purge", serde_json::json!({"days": days}))
                .await?;
            println!(
                "purged {} agents",
                result["removed"].as_u64().unwrap_or(0)
            );
            return Ok(());
        }
    };
    if ctx.output.is_json() {
        print_json(&agents);
        return Ok(());
    }
    render(&agents);
    Ok(())
}

fn render(agents: &Value) {
    let empty = Vec::new();
    let rows = agents.as_array().unwrap_or(&empty);
    if rows.is_empty() {
        println!("No agents");
        return;
    }
    let mut table = Table::new(vec![
        Column::left("NAME"),
        Column::left("PROGRAM"),
        Column::left("MODEL"),
        Column::muted("LAST ACTIVE"),
    ]);
    for agent in rows {
        table.row(vec![
            cell(agent, "name"),
            cell(agent, "program"),
            cell(agent, "model"),
            format_time_ago(agent["last_active_at_ms"].as_u64().unwrap_or(0)),
        ]);
    }
    table.render(&mut std::io::stdout());
}
