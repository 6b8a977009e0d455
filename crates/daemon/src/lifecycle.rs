// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, recovery, shutdown.
//!
//! One daemon serves one project. An exclusive PID lock file keeps a
//! second daemon from opening the same stores; store integrity failures
//! abort startup (recovery goes through backups). Terminal sessions are
//! deliberately left alive across daemon restarts so long-running agents
//! keep working; `recover` reattaches to whatever survived.

use fs2::FileExt;
use squad_adapters::{
    DesktopNotifyAdapter, RandomNameGen, TmuxAdapter, TracedTerminal,
};
use squad_core::{resolve_project, Clock, ConfigError, CoreConfig, SystemClock};
use squad_engine::{BusConfig, EngineError, SignalBus, Stores, Supervisor};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::gateway::{AppState, ProdDeps};

/// Errors during daemon startup and shutdown
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("another daemon holds the lock at {0}")]
    AlreadyRunning(PathBuf),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Daemon path configuration for one project.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_root: PathBuf,
    pub state_dir: PathBuf,
    pub lock_path: PathBuf,
    pub log_path: PathBuf,
    pub project: String,
    pub core: CoreConfig,
}

impl Config {
    /// Resolve configuration for a project root.
    pub fn load(project_root: &Path) -> Result<Self, LifecycleError> {
        let core = CoreConfig::load(project_root)?;
        let state_dir = project_root.join(squad_core::config::STATE_DIR_NAME);
        Ok(Self {
            project_root: project_root.to_owned(),
            lock_path: state_dir.join("daemon.pid"),
            log_path: state_dir.join("daemon.log"),
            project: resolve_project(project_root),
            state_dir,
            core,
        })
    }
}

/// A running daemon: shared gateway state plus the held lock.
pub struct Daemon {
    pub state: Arc<AppState<ProdDeps>>,
    pub config: Config,
    // NOTE(lifetime): Held to maintain the exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
}

impl Daemon {
    /// Open the stores, take the lock, build the supervisor, and recover
    /// surviving sessions.
    pub async fn startup(config: Config) -> Result<Daemon, LifecycleError> {
        let lock_file = acquire_lock(&config.lock_path)?;

        let stores = Arc::new(Stores::open(&config.project_root, &config.project)?);
        let clock = SystemClock;
        let bus = Arc::new(SignalBus::new(clock.clone(), BusConfig::default()));
        let terminal = TracedTerminal::new(TmuxAdapter::new());
        let supervisor = Arc::new(Supervisor::new(
            terminal,
            DesktopNotifyAdapter::new(),
            clock.clone(),
            RandomNameGen::new(),
            config.core.clone(),
            config.project_root.clone(),
            Arc::clone(&stores),
            Arc::clone(&bus),
        ));

        let recovered = supervisor.recover().await?;
        info!(project = config.project, recovered, "daemon started");

        let state = Arc::new(AppState {
            supervisor,
            stores,
            bus,
            started_at_ms: clock.epoch_ms(),
            clock,
        });
        Ok(Daemon {
            state,
            config,
            lock_file,
        })
    }

    /// Graceful shutdown. Stores persist on every mutation, so there is
    /// nothing to flush; sessions are left alive for the next daemon.
    pub fn shutdown(&self) {
        info!(project = self.config.project, "daemon stopping");
    }
}

/// Take the exclusive PID lock, failing if another daemon holds it.
fn acquire_lock(path: &Path) -> Result<File, LifecycleError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| LifecycleError::Io {
            path: parent.to_owned(),
            source,
        })?;
    }
    let mut file = File::options()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path)
        .map_err(|source| LifecycleError::Io {
            path: path.to_owned(),
            source,
        })?;
    if file.try_lock_exclusive().is_err() {
        return Err(LifecycleError::AlreadyRunning(path.to_owned()));
    }
    let _ = file.set_len(0);
    let _ = writeln!(file, "{}", std::process::id());
    Ok(file)
}

/// Whether a daemon currently holds the project lock (used by the CLI for
/// direct-store fallbacks and the restore quiesce check).
pub fn lock_is_held(path: &Path) -> bool {
    let Ok(file) = File::options().read(true).write(true).open(path) else {
        return false;
    };
    match file.try_lock_exclusive() {
        Ok(()) => {
            let _ = fs2::FileExt::unlock(&file);
            false
        }
        Err(_) => true,
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
