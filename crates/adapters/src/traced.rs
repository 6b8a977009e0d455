// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::terminal::{CreateOutcome, Key, TerminalAdapter, TerminalError};
use async_trait::async_trait;
use std::path::Path;
use tracing::Instrument;

/// Wrapper that adds tracing to any TerminalAdapter
#[derive(Clone)]
pub struct TracedTerminal<T> {
    inner: T,
}

impl<T> TracedTerminal<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: TerminalAdapter> TerminalAdapter for TracedTerminal<T> {
    async fn create(
        &self,
        name: &str,
        cwd: &Path,
        initial_command: &str,
    ) -> Result<CreateOutcome, TerminalError> {
        async {
            let start = std::time::Instant::now();
            let result = self.inner.create(name, cwd, initial_command).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(CreateOutcome::Created) => tracing::info!(elapsed_ms, "session created"),
                Ok(CreateOutcome::AlreadyExists) => {
                    tracing::info!(elapsed_ms, "session already existed")
                }
                Err(e) => tracing::error!(elapsed_ms, error = %e, "create failed"),
            }
            result
        }
        .instrument(tracing::info_span!("terminal.create", name, cwd = %cwd.display()))
        .await
    }

    async fn send_text(&self, name: &str, text: &str) -> Result<(), TerminalError> {
        let result = self.inner.send_text(name, text).await;
        if let Err(ref e) = result {
            tracing::error!(name, text_len = text.len(), error = %e, "send_text failed");
        } else {
            tracing::debug!(name, text_len = text.len(), "text sent");
        }
        result
    }

    async fn send_key(&self, name: &str, key: Key) -> Result<(), TerminalError> {
        let result = self.inner.send_key(name, key).await;
        if let Err(ref e) = result {
            tracing::error!(name, key = key.name(), error = %e, "send_key failed");
        }
        result
    }

    async fn capture_tail(&self, name: &str, lines: u32) -> Result<String, TerminalError> {
        let result = self.inner.capture_tail(name, lines).await;
        match &result {
            Ok(text) => tracing::debug!(name, lines, captured = text.len(), "tail captured"),
            Err(e) => tracing::debug!(name, lines, error = %e, "capture_tail failed"),
        }
        result
    }

    async fn rename(&self, name: &str, new_name: &str) -> Result<(), TerminalError> {
        let result = self.inner.rename(name, new_name).await;
        match &result {
            Ok(()) => tracing::info!(name, new_name, "session renamed"),
            Err(e) => tracing::error!(name, new_name, error = %e, "rename failed"),
        }
        result
    }

    async fn kill(&self, name: &str) -> Result<(), TerminalError> {
        let result = self.inner.kill(name).await;
        match &result {
            Ok(()) => tracing::info!(name, "session killed"),
            Err(e) => tracing::error!(name, error = %e, "kill failed"),
        }
        result
    }

    async fn list(&self) -> Result<Vec<String>, TerminalError> {
        let result = self.inner.list().await;
        if let Ok(sessions) = &result {
            tracing::debug!(count = sessions.len(), "sessions listed");
        }
        result
    }

    async fn exists(&self, name: &str) -> Result<bool, TerminalError> {
        self.inner.exists(name).await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
