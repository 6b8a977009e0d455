// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake terminal adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{CreateOutcome, Key, TerminalAdapter, TerminalError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recorded terminal call
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalCall {
    Create {
        name: String,
        cwd: PathBuf,
        initial_command: String,
    },
    SendText {
        name: String,
        text: String,
    },
    SendKey {
        name: String,
        key: Key,
    },
    CaptureTail {
        name: String,
        lines: u32,
    },
    Rename {
        name: String,
        new_name: String,
    },
    Kill {
        name: String,
    },
    List,
    Exists {
        name: String,
    },
}

/// Fake terminal state
#[derive(Debug, Clone)]
pub struct FakeTerminal {
    pub name: String,
    pub cwd: PathBuf,
    pub initial_command: String,
    pub alive: bool,
    pub tail: Vec<String>,
    /// Text and keys injected, in order (keys rendered as `<Enter>` etc.)
    pub input: Vec<String>,
}

struct FakeTerminalState {
    terminals: HashMap<String, FakeTerminal>,
    calls: Vec<TerminalCall>,
    backend_absent: bool,
}

/// Fake terminal adapter for testing
#[derive(Clone)]
pub struct FakeTerminalAdapter {
    inner: Arc<Mutex<FakeTerminalState>>,
}

impl Default for FakeTerminalAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeTerminalState {
                terminals: HashMap::new(),
                calls: Vec::new(),
                backend_absent: false,
            })),
        }
    }
}

impl FakeTerminalAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<TerminalCall> {
        self.inner.lock().calls.clone()
    }

    /// Get a terminal by name
    pub fn get(&self, name: &str) -> Option<FakeTerminal> {
        self.inner.lock().terminals.get(name).cloned()
    }

    /// Simulate the multiplexer being absent
    pub fn set_backend_absent(&self, absent: bool) {
        self.inner.lock().backend_absent = absent;
    }

    /// Set the captured tail for a terminal
    pub fn set_tail(&self, name: &str, tail: Vec<String>) {
        if let Some(terminal) = self.inner.lock().terminals.get_mut(name) {
            terminal.tail = tail;
        }
    }

    /// Mark a terminal as gone without going through kill (crash simulation)
    pub fn vanish(&self, name: &str) {
        self.inner.lock().terminals.remove(name);
    }

    /// Add a pre-existing terminal (for recovery tests)
    pub fn add_terminal(&self, name: &str, alive: bool) {
        self.inner.lock().terminals.insert(
            name.to_string(),
            FakeTerminal {
                name: name.to_string(),
                cwd: PathBuf::new(),
                initial_command: String::new(),
                alive,
                tail: Vec::new(),
                input: Vec::new(),
            },
        );
    }

    /// Everything injected into a terminal, in order
    pub fn input_for(&self, name: &str) -> Vec<String> {
        self.inner
            .lock()
            .terminals
            .get(name)
            .map(|t| t.input.clone())
            .unwrap_or_default()
    }

    fn check_backend(&self) -> Result<(), TerminalError> {
        if self.inner.lock().backend_absent {
            Err(TerminalError::NoBackend("fake backend absent".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TerminalAdapter for FakeTerminalAdapter {
    async fn create(
        &self,
        name: &str,
        cwd: &Path,
        initial_command: &str,
    ) -> Result<CreateOutcome, TerminalError> {
        self.check_backend()?;
        let mut inner = self.inner.lock();
        inner.calls.push(TerminalCall::Create {
            name: name.to_string(),
            cwd: cwd.to_path_buf(),
            initial_command: initial_command.to_string(),
        });

        if inner.terminals.get(name).is_some_and(|t| t.alive) {
            return Ok(CreateOutcome::AlreadyExists);
        }

        inner.terminals.insert(
            name.to_string(),
            FakeTerminal {
                name: name.to_string(),
                cwd: cwd.to_path_buf(),
                initial_command: initial_command.to_string(),
                alive: true,
                tail: Vec::new(),
                input: Vec::new(),
            },
        );
        Ok(CreateOutcome::Created)
    }

    async fn send_text(&self, name: &str, text: &str) -> Result<(), TerminalError> {
        self.check_backend()?;
        let mut inner = self.inner.lock();
        inner.calls.push(TerminalCall::SendText {
            name: name.to_string(),
            text: text.to_string(),
        });
        match inner.terminals.get_mut(name) {
            Some(terminal) if terminal.alive => {
                terminal.input.push(text.to_string());
                Ok(())
            }
            _ => Err(TerminalError::NotFound(name.to_string())),
        }
    }

    async fn send_key(&self, name: &str, key: Key) -> Result<(), TerminalError> {
        self.check_backend()?;
        let mut inner = self.inner.lock();
        inner.calls.push(TerminalCall::SendKey {
            name: name.to_string(),
            key,
        });
        match inner.terminals.get_mut(name) {
            Some(terminal) if terminal.alive => {
                terminal.input.push(format!("<{}>", key.name()));
                Ok(())
            }
            _ => Err(TerminalError::NotFound(name.to_string())),
        }
    }

    async fn capture_tail(&self, name: &str, lines: u32) -> Result<String, TerminalError> {
        self.check_backend()?;
        let mut inner = self.inner.lock();
        inner.calls.push(TerminalCall::CaptureTail {
            name: name.to_string(),
            lines,
        });
        match inner.terminals.get(name) {
            Some(terminal) => {
                let start = terminal.tail.len().saturating_sub(lines as usize);
                Ok(terminal.tail[start..].join("\n"))
            }
            None => Err(TerminalError::NotFound(name.to_string())),
        }
    }

    async fn rename(&self, name: &str, new_name: &str) -> Result<(), TerminalError> {
        self.check_backend()?;
        let mut inner = self.inner.lock();
        inner.calls.push(TerminalCall::Rename {
            name: name.to_string(),
            new_name: new_name.to_string(),
        });
        match inner.terminals.remove(name) {
            Some(mut terminal) => {
                terminal.name = new_name.to_string();
                inner.terminals.insert(new_name.to_string(), terminal);
                Ok(())
            }
            None => Err(TerminalError::NotFound(name.to_string())),
        }
    }

    async fn kill(&self, name: &str) -> Result<(), TerminalError> {
        self.check_backend()?;
        let mut inner = self.inner.lock();
        inner.calls.push(TerminalCall::Kill {
            name: name.to_string(),
        });
        inner.terminals.remove(name);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, TerminalError> {
        self.check_backend()?;
        let mut inner = self.inner.lock();
        inner.calls.push(TerminalCall::List);
        let mut names: Vec<String> = inner
            .terminals
            .values()
            .filter(|t| t.alive)
            .map(|t| t.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn exists(&self, name: &str) -> Result<bool, TerminalError> {
        self.check_backend()?;
        let mut inner = self.inner.lock();
        inner.calls.push(TerminalCall::Exists {
            name: name.to_string(),
        });
        Ok(inner.terminals.get(name).is_some_and(|t| t.alive))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
