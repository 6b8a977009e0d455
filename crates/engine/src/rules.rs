// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Review rules: whether a completed task auto-proceeds or waits for a
//! human.
//!
//! Resolution precedence, most specific first:
//! 1. `review:always` / `review:auto` marker in the task's notes
//! 2. a `taskId` override in the rules file
//! 3. a per-epic override carried in the session context
//! 4. the rules file's `(type, maxAutoPriority)` table
//! 5. the rules file's `defaultAction`, then the environment default,
//!    then review_required

use serde::{Deserialize, Serialize};
use squad_core::Task;
use std::path::Path;
use thiserror::Error;

/// What happens when a task completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Review,
    Auto,
}

impl ReviewAction {
    /// Parse a config-level action string (`review` | `auto`).
    pub fn parse(s: &str) -> Option<ReviewAction> {
        match s {
            "review" => Some(ReviewAction::Review),
            "auto" => Some(ReviewAction::Auto),
            _ => None,
        }
    }
}

/// One `(type, maxAutoPriority)` rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRule {
    #[serde(rename = "type")]
    pub issue_type: String,
    /// Highest priority value that still auto-proceeds; -1 disables auto
    /// for the type entirely.
    #[serde(rename = "maxAutoPriority")]
    pub max_auto_priority: i8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// One per-task override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOverride {
    #[serde(rename = "taskId")]
    pub task_id: String,
    /// `always_review` | `always_auto`
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Errors loading a rules file
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("cannot read rules file: {0}")]
    Read(#[from] std::io::Error),
    #[error("malformed rules file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Project-local review rules file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewRules {
    #[serde(default)]
    pub version: u32,
    #[serde(rename = "defaultAction", default, skip_serializing_if = "Option::is_none")]
    pub default_action: Option<ReviewAction>,
    #[serde(default)]
    pub rules: Vec<TypeRule>,
    #[serde(default)]
    pub overrides: Vec<TaskOverride>,
}

impl ReviewRules {
    /// Load `.squad/review-rules.json`. A missing file yields the empty
    /// rule set; a malformed file is an error.
    pub fn load(path: &Path) -> Result<ReviewRules, RulesError> {
        if !path.exists() {
            return Ok(ReviewRules::default());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Resolve the action for a completed task.
    ///
    /// `session_override` is the per-epic override from the session
    /// context; `env_default` is the `SQUAD_REVIEW_DEFAULT` action.
    pub fn resolve(
        &self,
        task: &Task,
        session_override: Option<ReviewAction>,
        env_default: Option<ReviewAction>,
    ) -> ReviewAction {
        if let Some(action) = notes_override(&task.notes) {
            return action;
        }

        if let Some(entry) = self
            .overrides
            .iter()
            .find(|o| o.task_id == task.id.as_str())
        {
            match entry.action.as_str() {
                "always_review" => return ReviewAction::Review,
                "always_auto" => return ReviewAction::Auto,
                other => {
                    tracing::warn!(task = %task.id, action = other, "unknown override action ignored")
                }
            }
        }

        if let Some(action) = session_override {
            return action;
        }

        let type_name = task.issue_type.to_string();
        if let Some(rule) = self.rules.iter().find(|r| r.issue_type == type_name) {
            // A priority strictly greater than the threshold falls back to
            // review_required.
            return if i8::try_from(task.priority.value()).unwrap_or(i8::MAX)
                <= rule.max_auto_priority
            {
                ReviewAction::Auto
            } else {
                ReviewAction::Review
            };
        }

        self.default_action
            .or(env_default)
            .unwrap_or(ReviewAction::Review)
    }
}

/// `review:always` / `review:auto` marker anywhere in the task notes.
fn notes_override(notes: &str) -> Option<ReviewAction> {
    if notes.contains("review:always") {
        Some(ReviewAction::Review)
    } else if notes.contains("review:auto") {
        Some(ReviewAction::Auto)
    } else {
        None
    }
}

#[cfg(test)]
#[path = "rules_tests.rs"]
mod tests;
