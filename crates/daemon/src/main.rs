// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Squad Daemon (squadd)
//!
//! Background process serving one project: owns the stores, the session
//! supervisor, the signal bus, and the HTTP/stream gateway.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use squad_daemon::lifecycle::{Config, Daemon, LifecycleError};
use squad_daemon::{router, AppState, ProdDeps};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// How often the supervisor sweeps for stale and expired sessions.
const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut project_root = std::env::current_dir()?;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("squadd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" => {
                println!("squadd {}", env!("CARGO_PKG_VERSION"));
                println!("Squad Daemon - owns the stores, supervisor, and gateway for one project");
                println!();
                println!("USAGE:");
                println!("    squadd [-C <dir>]");
                println!();
                println!("The daemon is typically started by the `squad` CLI. It serves");
                println!("HTTP on the address from .squad/config.toml or SQUAD_HTTP_ADDR.");
                println!();
                println!("OPTIONS:");
                println!("    -C <dir>         Project root (default: current directory)");
                println!("    -h, --help       Print help information");
                println!("    -V, --version    Print version information");
                return Ok(());
            }
            "-C" => match args.next() {
                Some(dir) => project_root = PathBuf::from(dir),
                None => {
                    eprintln!("error: -C requires a directory");
                    std::process::exit(1);
                }
            },
            other => {
                eprintln!("error: unexpected argument '{other}'");
                eprintln!("Usage: squadd [-C <dir>]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load(&project_root)?;
    let _log_guard = setup_logging(&config)?;

    info!(project = config.project, "starting daemon");
    let daemon = match Daemon::startup(config).await {
        Ok(daemon) => daemon,
        Err(LifecycleError::AlreadyRunning(path)) => {
            let pid = std::fs::read_to_string(&path).unwrap_or_default();
            eprintln!("squadd is already running");
            if !pid.trim().is_empty() {
                eprintln!("  pid: {}", pid.trim());
            }
            std::process::exit(1);
        }
        Err(e) => {
            error!(error = %e, "failed to start daemon");
            return Err(e.into());
        }
    };

    let addr = daemon.config.core.http_addr.clone();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr, "gateway listening");

    spawn_sweeper(Arc::clone(&daemon.state));

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    // Startup marker for wrapper scripts tailing our stdout; the CLI
    // itself probes /status instead.
    println!("READY");

    let app = router(Arc::clone(&daemon.state));
    let serve = axum::serve(listener, app);
    tokio::select! {
        result = serve => {
            if let Err(e) = result {
                error!(error = %e, "gateway server stopped");
            }
        }
        _ = sigterm.recv() => info!("SIGTERM received"),
        _ = sigint.recv() => info!("SIGINT received"),
    }

    daemon.shutdown();
    Ok(())
}

/// Periodic heartbeat sweep: stale sessions die, complete sessions past
/// the grace period are destroyed.
fn spawn_sweeper(state: Arc<AppState<ProdDeps>>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            match state.supervisor.sweep().await {
                Ok(died) if !died.is_empty() => {
                    info!(count = died.len(), "sweep marked sessions dead");
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "sweep failed"),
            }
        }
    });
}

/// File logging through a non-blocking appender, filtered by RUST_LOG.
fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&config.state_dir)?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}
