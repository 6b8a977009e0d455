// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `squad work` — spawn sessions.

use crate::client::Context;
use crate::output::{cell, print_json};
use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::json;

#[derive(Args)]
pub struct WorkArgs {
    #[command(subcommand)]
    pub command: WorkCommand,
}

#[derive(Subcommand)]
pub enum WorkCommand {
    /// Spawn an agent session (daemon picks the task unless given)
    Spawn {
        /// Agent name; omitted invents a fresh two-word name
        #[arg(long)]
        agent: Option<String>,
        /// Task id; omitted asks the scheduler (work mode)
        #[arg(long)]
        task: Option<String>,
        /// Session mode: work | chat | plan
        #[arg(long, default_value = "work")]
        mode: String,
        /// Agent program to run
        #[arg(long)]
        program: Option<String>,
        /// Model hint passed to the program
        #[arg(long)]
        model: Option<String>,
    },
}

pub async fn work(ctx: &Context, args: WorkArgs) -> Result<()> {
    match args.command {
        WorkCommand::Spawn {
            agent,
            task,
            mode,
            program,
            model,
        } => {
            let record = ctx
                .post(
                    "/work/spawn",
                    json!({
                        "agent": agent,
                        "task": task,
                        "mode": mode,
                        "program": program,
                        "model": model,
                    }),
                )
                .await?;
            if ctx.output.is_json() {
                print_json(&record);
            } else {
                let task = cell(&record, "task");
                println!("{} spawned ({})", cell(&record, "name"), task);
            }
            Ok(())
        }
    }
}
