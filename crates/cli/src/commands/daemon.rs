// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `squad daemon` — start, stop, and inspect the project daemon.

use crate::client::Context;
use crate::exit_error::ExitError;
use crate::output::print_json;
use anyhow::Result;
use clap::{Args, Subcommand};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

const STARTUP_TIMEOUT: Duration = Duration::from_secs(15);
const STARTUP_PROBE_TIMEOUT: Duration = Duration::from_millis(500);
const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start squadd for this project
    Start,
    /// Stop the running daemon
    Stop,
    /// Daemon health and counters
    Status,
}

pub async fn daemon(ctx: &Context, args: DaemonArgs) -> Result<()> {
    match args.command {
        DaemonCommand::Start => start(ctx).await,
        DaemonCommand::Stop => stop(ctx),
        DaemonCommand::Status => status(ctx).await,
    }
}

async fn start(ctx: &Context) -> Result<()> {
    if ctx.daemon_running() {
        println!("daemon already running");
        return Ok(());
    }

    // SQUAD_INSTALL_DIR wins; otherwise squadd ships next to the squad binary
    let squadd = ctx
        .config
        .install_dir
        .as_ref()
        .map(|dir| dir.join("squadd"))
        .filter(|p| p.exists())
        .or_else(|| {
            std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(|dir| dir.join("squadd")))
                .filter(|p| p.exists())
        })
        .unwrap_or_else(|| "squadd".into());

    let mut child = Command::new(&squadd)
        .arg("-C")
        .arg(&ctx.project_root)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ExitError::state(format!("cannot start {}: {e}", squadd.display())))?;

    // Poll the gateway until it answers. Every probe carries its own
    // timeout, so a daemon that hangs before serving anything is bounded
    // by the deadline rather than by a pipe read that never returns.
    let base = format!("http://{}", ctx.config.http_addr);
    let probe = reqwest::Client::builder()
        .timeout(STARTUP_PROBE_TIMEOUT)
        .build()
        .map_err(|e| ExitError::state(format!("http client: {e}")))?;
    let deadline = Instant::now() + STARTUP_TIMEOUT;
    loop {
        if let Ok(Some(status)) = child.try_wait() {
            return Err(ExitError::state(format!(
                "squadd exited during startup ({status})"
            ))
            .into());
        }
        let ready = probe
            .get(format!("{base}/status"))
            .send()
            .await
            .is_ok_and(|response| response.status().is_success());
        if ready {
            break;
        }
        if Instant::now() > deadline {
            return Err(ExitError::state("squadd did not become ready in time").into());
        }
        tokio::time::sleep(STARTUP_POLL_INTERVAL).await;
    }
    println!("daemon started on {}", ctx.config.http_addr);
    Ok(())
}

fn stop(ctx: &Context) -> Result<()> {
    let pid_path = ctx.project_root.join(".squad").join("daemon.pid");
    let pid = std::fs::read_to_string(&pid_path)
        .ok()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .ok_or_else(|| ExitError::user("no daemon pid file"))?;
    let killed = Command::new("kill")
        .arg(pid.to_string())
        .status()
        .map(|s| s.success())
        .unwrap_or(false);
    if killed {
        println!("daemon stopped (pid {pid})");
        Ok(())
    } else {
        Err(ExitError::state(format!("could not signal pid {pid}")).into())
    }
}

async fn status(ctx: &Context) -> Result<()> {
    if !ctx.daemon_running() {
        println!("daemon not running");
        return Ok(());
    }
    let status = ctx.get("/status").await?;
    if ctx.output.is_json() {
        print_json(&status);
    } else {
        println!(
            "running; {} tasks ({} ready), {} sessions ({} live), last signal seq {}",
            status["tasks"].as_u64().unwrap_or(0),
            status["ready"].as_u64().unwrap_or(0),
            status["sessions"].as_u64().unwrap_or(0),
            status["live_sessions"].as_u64().unwrap_or(0),
            status["last_signal_seq"].as_u64().unwrap_or(0),
        );
    }
    Ok(())
}
