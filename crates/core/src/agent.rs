// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent registry record.

use serde::{Deserialize, Serialize};

/// A named logical worker (human or AI driven).
///
/// The registry is a flat mapping by name; no cross-agent ordering exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Stable two-word PascalCase name, e.g. `AlphaGlade`
    pub name: String,
    /// Program driving the agent (e.g. `claude-code`)
    pub program: String,
    /// Model the program runs
    pub model: String,
    pub created_at_ms: u64,
    pub last_active_at_ms: u64,
}

impl AgentRecord {
    pub fn new(
        name: impl Into<String>,
        program: impl Into<String>,
        model: impl Into<String>,
        now_ms: u64,
    ) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            model: model.into(),
            created_at_ms: now_ms,
            last_active_at_ms: now_ms,
        }
    }
}
