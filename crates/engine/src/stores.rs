// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared handle over the durable stores.
//!
//! Each store keeps its single-writer discipline behind its own mutex;
//! readers work on cloned snapshots. The ledger locks per path bucket
//! internally and needs no outer mutex.

use parking_lot::Mutex;
use squad_core::config::STATE_DIR_NAME;
use squad_storage::{AgentRegistry, LatestSignals, ReservationLedger, TaskStore};
use std::path::{Path, PathBuf};

use crate::EngineError;

/// Bundle of the durable stores for one project.
pub struct Stores {
    pub tasks: Mutex<TaskStore>,
    pub agents: Mutex<AgentRegistry>,
    pub ledger: ReservationLedger,
    pub signals: Mutex<LatestSignals>,
    state_dir: PathBuf,
}

impl Stores {
    /// Open (or create) every store under `<project_root>/.squad/`.
    pub fn open(project_root: &Path, project: &str) -> Result<Self, EngineError> {
        let state_dir = project_root.join(STATE_DIR_NAME);
        // memory/ belongs to the post-completion writeup consumer; the core
        // only guarantees the directory exists.
        std::fs::create_dir_all(state_dir.join("memory"))
            .map_err(|e| EngineError::Internal(e.to_string()))?;
        let tasks = TaskStore::open(&state_dir.join("tasks.db"), project)?;
        let agents = AgentRegistry::open(&state_dir.join("agents.db"))?;
        let ledger = ReservationLedger::open(&state_dir.join("reservations.db"))?;
        let signals = LatestSignals::open(&state_dir.join("signals.db"))?;
        Ok(Self {
            tasks: Mutex::new(tasks),
            agents: Mutex::new(agents),
            ledger,
            signals: Mutex::new(signals),
            state_dir,
        })
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }
}
