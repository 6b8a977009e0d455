// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op terminal adapter for environments without a multiplexer.

use super::{CreateOutcome, Key, TerminalAdapter, TerminalError};
use async_trait::async_trait;
use std::path::Path;

/// Terminal adapter that accepts every call and does nothing.
#[derive(Clone, Copy, Default)]
pub struct NoOpTerminalAdapter;

impl NoOpTerminalAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TerminalAdapter for NoOpTerminalAdapter {
    async fn create(
        &self,
        _name: &str,
        _cwd: &Path,
        _initial_command: &str,
    ) -> Result<CreateOutcome, TerminalError> {
        Ok(CreateOutcome::Created)
    }

    async fn send_text(&self, _name: &str, _text: &str) -> Result<(), TerminalError> {
        Ok(())
    }

    async fn send_key(&self, _name: &str, _key: Key) -> Result<(), TerminalError> {
        Ok(())
    }

    async fn capture_tail(&self, _name: &str, _lines: u32) -> Result<String, TerminalError> {
        Ok(String::new())
    }

    async fn rename(&self, _name: &str, _new_name: &str) -> Result<(), TerminalError> {
        Ok(())
    }

    async fn kill(&self, _name: &str) -> Result<(), TerminalError> {
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, TerminalError> {
        Ok(Vec::new())
    }

    async fn exists(&self, _name: &str) -> Result<bool, TerminalError> {
        Ok(false)
    }
}
