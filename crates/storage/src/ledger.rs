// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File reservation ledger.
//!
//! Advisory `(path -> agent)` locks preventing concurrent edits. Lookups
//! and mutations take a per-bucket lock chosen by path hash so unrelated
//! paths never contend; the full set is persisted after each mutation.

use crate::store::{load_document, write_atomic, StoreError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use squad_core::{FileReservation, TaskId};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

const BUCKETS: usize = 16;

/// Result of an acquire attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcquireOutcome {
    Acquired,
    /// The path is already reserved; conflict responses are informational
    /// and the caller decides whether to block or proceed.
    Conflict { existing_agent: String },
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerDocument {
    reservations: Vec<FileReservation>,
}

/// In-memory bucketed reservation set with a durable mirror.
pub struct ReservationLedger {
    path: PathBuf,
    buckets: Vec<Mutex<HashMap<String, FileReservation>>>,
    /// Serializes persistence so concurrent mutators cannot interleave
    /// partial snapshots on disk.
    persist_lock: Mutex<()>,
}

fn bucket_index(path: &str) -> usize {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    (hasher.finish() as usize) % BUCKETS
}

impl ReservationLedger {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let mut buckets: Vec<Mutex<HashMap<String, FileReservation>>> =
            (0..BUCKETS).map(|_| Mutex::new(HashMap::new())).collect();

        if let Some(document) = load_document::<LedgerDocument>(path)? {
            for reservation in document.reservations {
                let index = bucket_index(&reservation.path);
                buckets[index]
                    .get_mut()
                    .insert(reservation.path.clone(), reservation);
            }
        }

        Ok(Self {
            path: path.to_owned(),
            buckets,
            persist_lock: Mutex::new(()),
        })
    }

    fn persist(&self) -> Result<(), StoreError> {
        let _guard = self.persist_lock.lock();
        let mut reservations: Vec<FileReservation> = self
            .buckets
            .iter()
            .flat_map(|bucket| bucket.lock().values().cloned().collect::<Vec<_>>())
            .collect();
        reservations.sort_by(|a, b| a.path.cmp(&b.path));
        write_atomic(&self.path, &LedgerDocument { reservations })
    }

    /// Try to reserve `path` for `agent`. At most one reservation per path.
    pub fn acquire(
        &self,
        path: &str,
        agent: &str,
        task: &TaskId,
        now_ms: u64,
    ) -> Result<AcquireOutcome, StoreError> {
        {
            let mut bucket = self.buckets[bucket_index(path)].lock();
            if let Some(existing) = bucket.get(path) {
                if existing.agent != agent {
                    return Ok(AcquireOutcome::Conflict {
                        existing_agent: existing.agent.clone(),
                    });
                }
                // Same agent re-reserving is a refresh
            }
            bucket.insert(
                path.to_string(),
                FileReservation {
                    path: path.to_string(),
                    agent: agent.to_string(),
                    task: task.clone(),
                    acquired_at_ms: now_ms,
                },
            );
        }
        self.persist()?;
        Ok(AcquireOutcome::Acquired)
    }

    /// Release everything held by `agent`; returns how many were dropped.
    pub fn release_agent(&self, agent: &str) -> Result<usize, StoreError> {
        let mut removed = 0;
        for bucket in &self.buckets {
            let mut bucket = bucket.lock();
            let before = bucket.len();
            bucket.retain(|_, r| r.agent != agent);
            removed += before - bucket.len();
        }
        if removed > 0 {
            self.persist()?;
        }
        Ok(removed)
    }

    /// Release one path regardless of holder.
    pub fn release_path(&self, path: &str) -> Result<bool, StoreError> {
        let removed = self.buckets[bucket_index(path)].lock().remove(path).is_some();
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    /// Reservations, optionally restricted to one agent, sorted by path.
    pub fn list(&self, agent: Option<&str>) -> Vec<FileReservation> {
        let mut reservations: Vec<FileReservation> = self
            .buckets
            .iter()
            .flat_map(|bucket| bucket.lock().values().cloned().collect::<Vec<_>>())
            .filter(|r| agent.is_none_or(|a| r.agent == a))
            .collect();
        reservations.sort_by(|a, b| a.path.cmp(&b.path));
        reservations
    }

    /// Current holder of a path, if any.
    pub fn holder(&self, path: &str) -> Option<String> {
        self.buckets[bucket_index(path)]
            .lock()
            .get(path)
            .map(|r| r.agent.clone())
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
