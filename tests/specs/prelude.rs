//! Test helpers for behavioral specifications.
//!
//! Provides a small DSL for invoking the squad CLI against a temporary
//! project directory in direct-store mode.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use assert_cmd::Command;
use serde_json::Value;
use std::path::Path;

/// A temporary project the CLI operates on.
pub struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// A squad command rooted at this project, JSON output.
    pub fn squad(&self) -> Command {
        let mut cmd = Command::cargo_bin("squad").unwrap();
        cmd.arg("-C")
            .arg(self.dir.path())
            .arg("--output")
            .arg("json")
            .env("NO_COLOR", "1");
        cmd
    }

    /// Run a squad command, assert success, parse stdout as JSON.
    pub fn run_json(&self, args: &[&str]) -> Value {
        let output = self.squad().args(args).assert().success();
        let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
        serde_json::from_str(&stdout).unwrap()
    }

    /// Run a squad command expecting failure; returns (exit code, stderr).
    pub fn run_err(&self, args: &[&str]) -> (i32, String) {
        let output = self.squad().args(args).output().unwrap();
        let code = output.status.code().unwrap_or(-1);
        (code, String::from_utf8_lossy(&output.stderr).into_owned())
    }

    /// Create a task and return its id.
    pub fn create_task(&self, title: &str, extra: &[&str]) -> String {
        let mut args = vec!["create", title];
        args.extend_from_slice(extra);
        self.run_json(&args)["id"].as_str().unwrap().to_string()
    }
}
