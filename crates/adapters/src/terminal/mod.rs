// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal driver: abstract verbs over the multiplexer.
//!
//! One adapter per backend; the rest of the core only sees this trait.
//! When the backend is absent every operation fails with `NoBackend` and
//! callers degrade (the supervisor refuses to spawn, the gateway serves
//! 503).

mod noop;
mod tmux;

pub use noop::NoOpTerminalAdapter;
pub use tmux::TmuxAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeTerminal, FakeTerminalAdapter, TerminalCall};

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors from terminal operations
#[derive(Debug, Error)]
pub enum TerminalError {
    /// The multiplexer binary is absent or unresponsive
    #[error("terminal backend unavailable: {0}")]
    NoBackend(String),
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
}

/// Result of an idempotent create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// A session with this name already exists; the existing one is kept.
    AlreadyExists,
}

/// Named keys the driver can inject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Tab,
    Backspace,
    CtrlC,
    CtrlD,
}

impl Key {
    /// The tmux `send-keys` name for this key.
    pub fn name(self) -> &'static str {
        match self {
            Key::Enter => "Enter",
            Key::Escape => "Escape",
            Key::Up => "Up",
            Key::Down => "Down",
            Key::Left => "Left",
            Key::Right => "Right",
            Key::Tab => "Tab",
            Key::Backspace => "BSpace",
            Key::CtrlC => "C-c",
            Key::CtrlD => "C-d",
        }
    }
}

/// Adapter for managing terminal sessions (tmux, etc.)
#[async_trait]
pub trait TerminalAdapter: Clone + Send + Sync + 'static {
    /// Create a session. Idempotent by name: an existing session is left
    /// alone and reported as [`CreateOutcome::AlreadyExists`].
    async fn create(
        &self,
        name: &str,
        cwd: &Path,
        initial_command: &str,
    ) -> Result<CreateOutcome, TerminalError>;

    /// Send literal text to a session (no key interpretation)
    async fn send_text(&self, name: &str, text: &str) -> Result<(), TerminalError>;

    /// Send a named key to a session
    async fn send_key(&self, name: &str, key: Key) -> Result<(), TerminalError>;

    /// Capture the last `lines` visible in the primary pane. Lossy on very
    /// long output.
    async fn capture_tail(&self, name: &str, lines: u32) -> Result<String, TerminalError>;

    /// Rename a session
    async fn rename(&self, name: &str, new_name: &str) -> Result<(), TerminalError>;

    /// Kill a session. Killing a missing session is not an error.
    async fn kill(&self, name: &str) -> Result<(), TerminalError>;

    /// List the names of live sessions
    async fn list(&self) -> Result<Vec<String>, TerminalError>;

    /// Check whether a session exists
    async fn exists(&self, name: &str) -> Result<bool, TerminalError>;
}
