// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tmux terminal adapter

use super::{CreateOutcome, Key, TerminalAdapter, TerminalError};
use async_trait::async_trait;
use std::path::Path;
use std::process::Output;
use tokio::process::Command;

/// Tmux-based terminal adapter
#[derive(Clone, Default)]
pub struct TmuxAdapter;

impl TmuxAdapter {
    pub fn new() -> Self {
        Self
    }
}

async fn run_tmux(args: &[&str]) -> Result<Output, TerminalError> {
    Command::new("tmux")
        .args(args)
        .output()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TerminalError::NoBackend("tmux not installed".into()),
            _ => TerminalError::CommandFailed(e.to_string()),
        })
}

#[async_trait]
impl TerminalAdapter for TmuxAdapter {
    async fn create(
        &self,
        name: &str,
        cwd: &Path,
        initial_command: &str,
    ) -> Result<CreateOutcome, TerminalError> {
        // Precondition: cwd must exist
        if !cwd.exists() {
            return Err(TerminalError::CommandFailed(format!(
                "working directory does not exist: {}",
                cwd.display()
            )));
        }

        let existing = run_tmux(&["has-session", "-t", name]).await?;
        if existing.status.success() {
            tracing::debug!(session = name, "session already exists");
            return Ok(CreateOutcome::AlreadyExists);
        }

        let cwd_text = cwd.to_string_lossy();
        let mut args = vec!["new-session", "-d", "-s", name, "-c", cwd_text.as_ref()];
        if !initial_command.is_empty() {
            args.push(initial_command);
        }

        let output = run_tmux(&args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(session = name, stderr = %stderr, "tmux create failed");
            return Err(TerminalError::CommandFailed(stderr.to_string()));
        }

        // Log stderr even on success - may contain useful warnings
        if !output.stderr.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(session = name, stderr = %stderr, "tmux create stderr (non-fatal)");
        }

        Ok(CreateOutcome::Created)
    }

    async fn send_text(&self, name: &str, text: &str) -> Result<(), TerminalError> {
        // -l = literal mode (no key name interpretation)
        // -- = end of options (handles text starting with -)
        let output = run_tmux(&["send-keys", "-t", name, "-l", "--", text]).await?;
        if !output.status.success() {
            return Err(TerminalError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn send_key(&self, name: &str, key: Key) -> Result<(), TerminalError> {
        let output = run_tmux(&["send-keys", "-t", name, key.name()]).await?;
        if !output.status.success() {
            return Err(TerminalError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn capture_tail(&self, name: &str, lines: u32) -> Result<String, TerminalError> {
        let start = format!("-{lines}");
        let output = run_tmux(&["capture-pane", "-t", name, "-p", "-S", &start]).await?;
        if !output.status.success() {
            return Err(TerminalError::NotFound(name.to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn rename(&self, name: &str, new_name: &str) -> Result<(), TerminalError> {
        let output = run_tmux(&["rename-session", "-t", name, new_name]).await?;
        if !output.status.success() {
            return Err(TerminalError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn kill(&self, name: &str) -> Result<(), TerminalError> {
        let output = run_tmux(&["kill-session", "-t", name]).await?;
        if !output.status.success() {
            // Session might already be dead, which is fine
            tracing::debug!(session = name, "kill-session on missing session");
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, TerminalError> {
        let output = run_tmux(&["list-sessions", "-F", "#{session_name}"]).await?;
        if !output.status.success() {
            // tmux exits non-zero when no server is running; that means no
            // sessions, not an error.
            return Ok(Vec::new());
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect())
    }

    async fn exists(&self, name: &str) -> Result<bool, TerminalError> {
        let output = run_tmux(&["has-session", "-t", name]).await?;
        Ok(output.status.success())
    }
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
