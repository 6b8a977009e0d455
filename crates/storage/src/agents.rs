// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable agent registry.
//!
//! A flat mapping of stable agent names to descriptive records. Used by
//! the supervisor to invent names for new agents and to offer resumption
//! of recently seen ones.

use crate::store::{load_document, write_atomic, StoreError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use squad_core::{AgentRecord, NameGen};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DOCUMENT_VERSION: u32 = 1;

/// Errors from registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("agent not found: {0}")]
    NotFound(String),
    #[error("name dictionary exhausted")]
    NamesExhausted,
}

#[derive(Debug, Serialize, Deserialize)]
struct RegistryDocument {
    version: u32,
    agents: IndexMap<String, AgentRecord>,
}

/// Durable catalogue of agents.
#[derive(Debug)]
pub struct AgentRegistry {
    path: PathBuf,
    agents: IndexMap<String, AgentRecord>,
}

impl AgentRegistry {
    pub fn open(path: &Path) -> Result<Self, RegistryError> {
        let document: Option<RegistryDocument> = load_document(path)?;
        Ok(Self {
            path: path.to_owned(),
            agents: document.map(|d| d.agents).unwrap_or_default(),
        })
    }

    fn persist(&self) -> Result<(), RegistryError> {
        write_atomic(
            &self.path,
            &RegistryDocument {
                version: DOCUMENT_VERSION,
                agents: self.agents.clone(),
            },
        )?;
        Ok(())
    }

    /// Register an agent. Idempotent by name: a known name returns the
    /// existing record untouched. An omitted name draws an unused one from
    /// the dictionary.
    pub fn register<G: NameGen>(
        &mut self,
        name: Option<&str>,
        program: &str,
        model: &str,
        names: &G,
        now_ms: u64,
    ) -> Result<AgentRecord, RegistryError> {
        let name = match name {
            Some(existing) if self.agents.contains_key(existing) => {
                // IndexMap::get after contains_key cannot miss
                return self
                    .agents
                    .get(existing)
                    .cloned()
                    .ok_or_else(|| RegistryError::NotFound(existing.to_string()));
            }
            Some(proposed) => proposed.to_string(),
            None => self.invent_name(names)?,
        };

        let record = AgentRecord::new(name.clone(), program, model, now_ms);
        self.agents.insert(name, record.clone());
        self.persist()?;
        Ok(record)
    }

    fn invent_name<G: NameGen>(&self, names: &G) -> Result<String, RegistryError> {
        // The dictionary space is ~2700 combinations; a long collision run
        // means the registry needs a purge, not more retries.
        for _ in 0..4096 {
            let candidate = names.candidate();
            if !self.agents.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
        Err(RegistryError::NamesExhausted)
    }

    pub fn get(&self, name: &str) -> Option<&AgentRecord> {
        self.agents.get(name)
    }

    /// Agents seen within the window, most recently active first.
    pub fn recent(&self, within: Duration, now_ms: u64) -> Vec<AgentRecord> {
        let cutoff = now_ms.saturating_sub(within.as_millis() as u64);
        let mut recent: Vec<AgentRecord> = self
            .agents
            .values()
            .filter(|a| a.last_active_at_ms >= cutoff)
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.last_active_at_ms.cmp(&a.last_active_at_ms));
        recent
    }

    /// Update last_active_at. Called by the supervisor on any signal.
    pub fn touch(&mut self, name: &str, now_ms: u64) -> Result<(), RegistryError> {
        let record = self
            .agents
            .get_mut(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        record.last_active_at_ms = now_ms;
        self.persist()?;
        Ok(())
    }

    /// Remove agents not seen within the window; returns how many.
    pub fn purge(&mut self, older_than: Duration, now_ms: u64) -> Result<usize, RegistryError> {
        let cutoff = now_ms.saturating_sub(older_than.as_millis() as u64);
        let before = self.agents.len();
        self.agents.retain(|_, a| a.last_active_at_ms >= cutoff);
        let removed = before - self.agents.len();
        if removed > 0 {
            self.persist()?;
        }
        Ok(removed)
    }

    pub fn all(&self) -> Vec<AgentRecord> {
        self.agents.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
#[path = "agents_tests.rs"]
mod tests;
