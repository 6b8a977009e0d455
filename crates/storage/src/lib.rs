// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable stores for the squad orchestration core.
//!
//! Every store follows the same discipline: one JSON document per store,
//! rewritten atomically (tmp file, fsync, rename, directory fsync) on each
//! mutation before the call returns; reads come from the in-memory image.

mod agents;
mod backup;
mod ledger;
mod signals;
mod store;
mod tasks;

pub use agents::{AgentRegistry, RegistryError};
pub use backup::{BackupError, BackupInfo, Backups, VerifyOutcome};
pub use ledger::{AcquireOutcome, ReservationLedger};
pub use signals::LatestSignals;
pub use store::{load_document, write_atomic, write_atomic_bytes, StoreError};
pub use tasks::{EpicProgress, TaskFilter, TaskSpec, TaskStore, TaskStoreError};
