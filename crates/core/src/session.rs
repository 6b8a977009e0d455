// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session record and lifecycle state machine.
//!
//! A session is a live terminal attached to an agent, possibly running a
//! task. State transitions are driven by agent signals and explicit RPCs;
//! the allowed edges live here so the supervisor and tests share one table.

use crate::signal::SignalKind;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

crate::define_id! {
    /// Terminal session name: the configured prefix plus the agent name,
    /// e.g. `squad-AlphaGlade`.
    #[derive(PartialOrd, Ord)]
    pub struct SessionName;
}

impl SessionName {
    pub fn compose(prefix: &str, agent: &str) -> SessionName {
        SessionName::new(format!("{prefix}{agent}"))
    }
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Spawn accepted, terminal not yet created
    Pending,
    /// Terminal created, agent booting
    Starting,
    /// Agent committed to an approach and is working
    Working,
    /// Agent finished coding, awaiting approval
    Review,
    /// Completion protocol in progress
    Completing,
    /// Killed with intent to resume
    Paused,
    /// Task closed; kept for inspection until the grace period ends
    Complete,
    /// Terminal gone or killed for good
    Dead,
}

impl SessionState {
    /// Whether the session still has (or expects) a live terminal.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            SessionState::Pending
                | SessionState::Starting
                | SessionState::Working
                | SessionState::Review
                | SessionState::Completing
        )
    }

    /// States covered by the heartbeat sweep.
    pub fn heartbeat_monitored(self) -> bool {
        matches!(
            self,
            SessionState::Starting | SessionState::Working | SessionState::Review
        )
    }

    pub fn is_terminal(self) -> bool {
        self == SessionState::Dead
    }

    /// The state a signal of the given kind advances this session to.
    ///
    /// Returns `None` when the signal does not cause a transition from the
    /// current state (it is absorbed; durable payload state still updates).
    pub fn on_signal(self, kind: &SignalKind) -> Option<SessionState> {
        use SessionState::*;
        match (self, kind) {
            // `starting` signals are absorbed while starting
            (Starting, SignalKind::Working) => Some(Working),
            (Working, SignalKind::Review) => Some(Review),
            (Working, SignalKind::Completing) => Some(Completing),
            (Working, SignalKind::Paused) => Some(Paused),
            (Working, SignalKind::Dead) => Some(Dead),
            (Review, SignalKind::Working) => Some(Working),
            (Review, SignalKind::Complete) => Some(Complete),
            (Completing, SignalKind::Complete) => Some(Complete),
            (Starting | Review | Completing, SignalKind::Dead) => Some(Dead),
            _ => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Pending => "pending",
            SessionState::Starting => "starting",
            SessionState::Working => "working",
            SessionState::Review => "review",
            SessionState::Completing => "completing",
            SessionState::Paused => "paused",
            SessionState::Complete => "complete",
            SessionState::Dead => "dead",
        };
        write!(f, "{s}")
    }
}

/// Bounded ring buffer of captured pane lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputTail {
    capacity: usize,
    lines: VecDeque<String>,
}

impl OutputTail {
    pub const DEFAULT_CAPACITY: usize = 200;

    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            lines: VecDeque::new(),
        }
    }

    /// Replace the tail with the latest capture, keeping only the newest
    /// `capacity` lines.
    pub fn extend_from_capture(&mut self, capture: &str) {
        for line in capture.lines() {
            if self.lines.len() == self.capacity {
                self.lines.pop_front();
            }
            self.lines.push_back(line.to_string());
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for OutputTail {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

/// Supervisor-owned record of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub name: SessionName,
    pub agent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<crate::task::TaskId>,
    pub state: SessionState,
    #[serde(default)]
    pub last_signal_at_ms: u64,
    #[serde(default)]
    pub created_at_ms: u64,
    #[serde(default)]
    pub output_tail: OutputTail,
}

impl SessionRecord {
    pub fn new(name: SessionName, agent: impl Into<String>, now_ms: u64) -> Self {
        Self {
            name,
            agent: agent.into(),
            task: None,
            state: SessionState::Pending,
            last_signal_at_ms: now_ms,
            created_at_ms: now_ms,
            output_tail: OutputTail::default(),
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
