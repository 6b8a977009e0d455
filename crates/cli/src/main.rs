// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! squad - task and agent orchestration CLI

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod color;
mod commands;
mod exit_error;
mod output;
mod table;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{agent, backup, daemon, session, task, work};
use output::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "squad",
    version,
    about = "Squad - spawn and coordinate coding agents over a task graph",
    styles = color::styles()
)]
struct Cli {
    /// Change to <dir> before doing anything
    #[arg(short = 'C', global = true, value_name = "DIR")]
    directory: Option<PathBuf>,

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
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a task
    Create(task::CreateArgs),
    /// List tasks
    List(task::ListArgs),
    /// Show one task
    Show {
        /// Task id
        id: String,
    },
    /// Update task fields
    Update(task::UpdateArgs),
    /// Close a task
    Close {
        /// Task id
        id: String,
        /// Close even when dependencies are open (epic UAT workflows)
        #[arg(long = "override")]
        override_deps: bool,
    },
    /// Reopen a closed task
    Reopen {
        /// Task id
        id: String,
    },
    /// Show the ready queue
    Ready,
    /// Dependency management
    Dep(task::DepArgs),
    /// Epic management
    Epic(task::EpicArgs),
    /// Snapshot the stores
    Backup {
        /// Optional label for the backup directory
        #[arg(long)]
        label: Option<String>,
    },
    /// Restore the stores from a backup directory
    Rollback {
        /// Backup directory (or its name under .squad/backups)
        dir: String,
        /// Restore even with live sessions
        #[arg(long)]
        force: bool,
    },
    /// Spawn work sessions
    Work(work::WorkArgs),
    /// Session management
    Session(session::SessionArgs),
    /// Agent registry
    Agent(agent::AgentArgs),
    /// Daemon management
    Daemon(daemon::DaemonArgs),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let code = e
            .downcast_ref::<exit_error::ExitError>()
            .map_or(1, |c| c.code);
        eprintln!("Error: {e}");
        std::process::exit(code);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let project_root = match cli.directory {
        Some(dir) => dir.canonicalize().unwrap_or(dir),
        None => std::env::current_dir()?,
    };
    let ctx = client::Context::new(project_root, cli.output).await?;

    match cli.command {
        Commands::Create(args) => task::create(&ctx, args).await,
        Commands::List(args) => task::list(&ctx, args).await,
        Commands::Show { id } => task::show(&ctx, &id).await,
        Commands::Update(args) => task::update(&ctx, args).await,
        Commands::Close { id, override_deps } => task::close(&ctx, &id, override_deps).await,
        Commands::Reopen { id } => task::reopen(&ctx, &id).await,
        Commands::Ready => task::ready(&ctx).await,
        Commands::Dep(args) => task::dep(&ctx, args).await,
        Commands::Epic(args) => task::epic(&ctx, args).await,
        Commands::Backup { label } => backup::backup(&ctx, label).await,
        Commands::Rollback { dir, force } => backup::rollback(&ctx, &dir, force).await,
        Commands::Work(args) => work::work(&ctx, args).await,
        Commands::Session(args) => session::session(&ctx, args).await,
        Commands::Agent(args) => agent::agent(&ctx, args).await,
        Commands::Daemon(args) => daemon::daemon(&ctx, args).await,
    }
}
