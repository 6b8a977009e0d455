// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task identifier, status machine, and record.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

crate::define_id! {
    /// Stable human-readable task identifier.
    ///
    /// Roots are `<project>-<base36 slug>`; children are `<parent>.<n>`.
    /// The string shape is a display invariant only — hierarchy is carried
    /// by the explicit `parent` field, never recovered by parsing ids.
    #[derive(Default, PartialOrd, Ord)]
    pub struct TaskId;
}

fn id_pattern() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Literal pattern, verified by the id syntax tests
        #[allow(clippy::unwrap_used)]
        let pattern = regex::Regex::new(r"^[a-z][a-z0-9_-]*-[a-z0-9]{3,6}(\.[0-9]+)*$").unwrap();
        pattern
    })
}

impl TaskId {
    /// Validate the id against the task identifier syntax.
    pub fn validate(id: &str) -> Result<TaskId, TaskError> {
        if id_pattern().is_match(id) {
            Ok(TaskId::new(id))
        } else {
            Err(TaskError::InvalidId(id.to_string()))
        }
    }

    /// Derive the id for the `n`-th child of this task.
    pub fn child(&self, n: u32) -> TaskId {
        TaskId::new(format!("{}.{}", self.0, n))
    }
}

/// Kind of work a task represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    Bug,
    Feature,
    Task,
    Chore,
    Epic,
    /// Ingested from an external message channel
    Chat,
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueType::Bug => write!(f, "bug"),
            IssueType::Feature => write!(f, "feature"),
            IssueType::Task => write!(f, "task"),
            IssueType::Chore => write!(f, "chore"),
            IssueType::Epic => write!(f, "epic"),
            IssueType::Chat => write!(f, "chat"),
        }
    }
}

impl std::str::FromStr for IssueType {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bug" => Ok(IssueType::Bug),
            "feature" => Ok(IssueType::Feature),
            "task" => Ok(IssueType::Task),
            "chore" => Ok(IssueType::Chore),
            "epic" => Ok(IssueType::Epic),
            "chat" => Ok(IssueType::Chat),
            other => Err(TaskError::InvalidIssueType(other.to_string())),
        }
    }
}

/// Urgency 0..=4 where 0 is most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(u8);

impl Priority {
    pub const MOST_URGENT: Priority = Priority(0);
    pub const DEFAULT: Priority = Priority(2);

    pub fn new(value: u8) -> Result<Priority, TaskError> {
        if value <= 4 {
            Ok(Priority(value))
        } else {
            Err(TaskError::InvalidPriority(value))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::DEFAULT
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    InProgress,
    Blocked,
    Closed,
}

impl TaskStatus {
    /// Whether a transition from `self` to `to` is allowed.
    ///
    /// Closed is terminal; reopening goes through the explicit admin verb,
    /// which bypasses this table.
    pub fn can_transition(self, to: TaskStatus) -> bool {
        use TaskStatus::*;
        match (self, to) {
            (a, b) if a == b => true,
            (Open, InProgress) | (Open, Blocked) | (Open, Closed) => true,
            (InProgress, Open) | (InProgress, Blocked) | (InProgress, Closed) => true,
            (Blocked, Open) | (Blocked, InProgress) => true,
            _ => false,
        }
    }

    pub fn is_closed(self) -> bool {
        self == TaskStatus::Closed
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Open => write!(f, "open"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Blocked => write!(f, "blocked"),
            TaskStatus::Closed => write!(f, "closed"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(TaskStatus::Open),
            "in_progress" => Ok(TaskStatus::InProgress),
            "blocked" => Ok(TaskStatus::Blocked),
            "closed" => Ok(TaskStatus::Closed),
            other => Err(TaskError::InvalidStatus(other.to_string())),
        }
    }
}

/// Errors raised by task-level validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("invalid task id: {0}")]
    InvalidId(String),
    #[error("invalid issue type: {0}")]
    InvalidIssueType(String),
    #[error("invalid priority: {0} (expected 0..=4)")]
    InvalidPriority(u8),
    #[error("invalid status: {0}")]
    InvalidStatus(String),
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },
    #[error("in_progress requires an assignee")]
    AssigneeRequired,
}

/// Unit of work with dependency edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
    pub issue_type: IssueType,
    #[serde(default)]
    pub priority: Priority,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<TaskId>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub depends_on: BTreeSet<TaskId>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub labels: BTreeSet<String>,
    /// Number of children created so far (drives `<parent>.<n>` id assignment)
    #[serde(default)]
    pub child_count: u32,
    #[serde(default)]
    pub created_at_ms: u64,
    #[serde(default)]
    pub updated_at_ms: u64,
}

impl Task {
    /// Apply a status change, enforcing the transition table and the
    /// in_progress-requires-assignee invariant.
    pub fn transition(&mut self, to: TaskStatus) -> Result<(), TaskError> {
        if !self.status.can_transition(to) {
            return Err(TaskError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        if to == TaskStatus::InProgress && self.assignee.is_none() {
            return Err(TaskError::AssigneeRequired);
        }
        self.status = to;
        Ok(())
    }

    pub fn is_epic(&self) -> bool {
        self.issue_type == IssueType::Epic
    }
}

/// Partial update applied atomically by the store.
///
/// `None` fields are left untouched. Double-Option fields distinguish
/// "leave alone" from "clear".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeSet<String>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.notes.is_none()
            && self.issue_type.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.assignee.is_none()
            && self.labels.is_none()
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
