// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable latest-signal records.
//!
//! The transient stream lives in the bus; this store keeps only the most
//! recently received signal per (session, kind), which is what survives a
//! restart and feeds the live view's initial snapshot.

use crate::store::{load_document, write_atomic, StoreError};
use serde::{Deserialize, Serialize};
use squad_core::{Signal, SignalKind};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
struct SignalsDocument {
    signals: Vec<Signal>,
}

/// Latest durable signal per (session, kind).
#[derive(Debug)]
pub struct LatestSignals {
    path: PathBuf,
    by_key: HashMap<(String, SignalKind), Signal>,
}

impl LatestSignals {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let mut by_key: HashMap<(String, SignalKind), Signal> = HashMap::new();
        if let Some(document) = load_document::<SignalsDocument>(path)? {
            for signal in document.signals {
                let key = (signal.session.as_str().to_string(), signal.kind.clone());
                match by_key.get(&key) {
                    Some(existing) if existing.seq >= signal.seq => {}
                    _ => {
                        by_key.insert(key, signal);
                    }
                }
            }
        }
        Ok(Self {
            path: path.to_owned(),
            by_key,
        })
    }

    fn persist(&self) -> Result<(), StoreError> {
        let mut signals: Vec<Signal> = self.by_key.values().cloned().collect();
        signals.sort_by_key(|s| s.seq);
        write_atomic(&self.path, &SignalsDocument { signals })
    }

    /// Record a signal, overwriting any older one of the same kind for the
    /// same session.
    pub fn record(&mut self, signal: &Signal) -> Result<(), StoreError> {
        let key = (signal.session.as_str().to_string(), signal.kind.clone());
        self.by_key.insert(key, signal.clone());
        self.persist()
    }

    pub fn latest(&self, session: &str, kind: &SignalKind) -> Option<&Signal> {
        self.by_key.get(&(session.to_string(), kind.clone()))
    }

    /// All retained signals for one session, in receive order.
    pub fn for_session(&self, session: &str) -> Vec<Signal> {
        let mut signals: Vec<Signal> = self
            .by_key
            .iter()
            .filter(|((s, _), _)| s == session)
            .map(|(_, signal)| signal.clone())
            .collect();
        signals.sort_by_key(|s| s.seq);
        signals
    }

    /// Distinct session names with retained signals (restart recovery).
    pub fn sessions(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .by_key
            .keys()
            .map(|(session, _)| session.clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Drop everything retained for a session (kill cleanup).
    pub fn forget_session(&mut self, session: &str) -> Result<(), StoreError> {
        let before = self.by_key.len();
        self.by_key.retain(|(s, _), _| s != session);
        if self.by_key.len() != before {
            self.persist()?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "signals_tests.rs"]
mod tests;
