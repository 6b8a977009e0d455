// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed lifecycle signals emitted by running agents.
//!
//! Wire envelope: `{kind, payload, timestamp}`. Payloads are a tagged union
//! over the known kinds; unknown kinds are preserved verbatim and forwarded
//! to subscribers untouched. Extra fields inside known payloads survive a
//! decode/encode round trip via flattened capture maps.

use crate::session::SessionName;
use crate::task::TaskId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Kind of signal an agent can emit
///
/// Serializes as its snake_case name. Unknown names deserialize into
/// `Unknown` with the raw tag preserved, so a newer agent's signals pass
/// through untouched; the derive attributes cannot express that fallback,
/// hence the hand-written serde impls.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// Session entered the scheduler, about to begin work
    Starting,
    /// Agent has read the task and committed to an approach
    Working,
    /// Agent finished coding and awaits approval
    Review,
    /// Outbound conversational turn for chat tasks
    Reply,
    /// Step-by-step progress during the completion protocol
    Completing,
    /// Completion bundle after the task closed
    Complete,
    /// Session killed with intent to resume
    Paused,
    /// Session process gone
    Dead,
    /// Forward-compatibility: a kind this build does not know
    Unknown(String),
}

impl SignalKind {
    pub fn as_str(&self) -> &str {
        match self {
            SignalKind::Starting => "starting",
            SignalKind::Working => "working",
            SignalKind::Review => "review",
            SignalKind::Reply => "reply",
            SignalKind::Completing => "completing",
            SignalKind::Complete => "complete",
            SignalKind::Paused => "paused",
            SignalKind::Dead => "dead",
            SignalKind::Unknown(k) => k,
        }
    }

    /// Resolve a wire name, capturing unrecognized ones verbatim.
    fn from_name(name: String) -> SignalKind {
        match name.as_str() {
            "starting" => SignalKind::Starting,
            "working" => SignalKind::Working,
            "review" => SignalKind::Review,
            "reply" => SignalKind::Reply,
            "completing" => SignalKind::Completing,
            "complete" => SignalKind::Complete,
            "paused" => SignalKind::Paused,
            "dead" => SignalKind::Dead,
            _ => SignalKind::Unknown(name),
        }
    }
}

impl serde::Serialize for SignalKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for SignalKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(SignalKind::from_name(name))
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SignalKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SignalKind::from_name(s.to_string()))
    }
}

/// One modified file reported in a `review` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileModification {
    pub path: String,
    #[serde(rename = "changeType")]
    pub change_type: String,
    #[serde(rename = "linesAdded", default)]
    pub lines_added: u32,
    #[serde(rename = "linesRemoved", default)]
    pub lines_removed: u32,
}

/// Classification of an outbound `reply` turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyType {
    Ack,
    Answer,
    Progress,
    Completion,
}

/// Step markers of the completion protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletingStep {
    Verifying,
    Committing,
    Closing,
    Releasing,
    Complete,
}

/// Whether a completed task hands control back to a human.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionMode {
    ReviewRequired,
    AutoProceed,
}

/// Payload of a `starting` signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartingPayload {
    pub agent: String,
    pub task: TaskId,
    pub project: String,
    pub model: String,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(rename = "gitBranch", default)]
    pub git_branch: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of a `working` signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingPayload {
    pub task: TaskId,
    pub title: String,
    pub approach: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of a `review` signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewPayload {
    pub task: TaskId,
    #[serde(default)]
    pub summary: Vec<String>,
    #[serde(rename = "filesModified", default)]
    pub files_modified: Vec<FileModification>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of a `reply` signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyPayload {
    pub task: TaskId,
    pub message: String,
    #[serde(rename = "replyType")]
    pub reply_type: ReplyType,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of a `completing` progress signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletingPayload {
    pub step: CompletingStep,
    #[serde(default)]
    pub percent: u8,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of a `complete` bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletePayload {
    #[serde(rename = "taskId")]
    pub task_id: TaskId,
    #[serde(default)]
    pub summary: String,
    #[serde(rename = "humanActions", default)]
    pub human_actions: Vec<String>,
    #[serde(rename = "suggestedTasks", default)]
    pub suggested_tasks: Vec<String>,
    #[serde(rename = "completionMode")]
    pub completion_mode: CompletionMode,
    #[serde(rename = "nextTaskId", default, skip_serializing_if = "Option::is_none")]
    pub next_task_id: Option<TaskId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of a `paused` signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PausedPayload {
    pub task: TaskId,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Kind-specific structured payload.
///
/// Serialized as the bare payload object; the pairing with a kind lives in
/// the envelope, so the union is untagged on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalPayload {
    Starting(StartingPayload),
    Working(WorkingPayload),
    Review(ReviewPayload),
    Reply(ReplyPayload),
    Completing(CompletingPayload),
    Complete(CompletePayload),
    Paused(PausedPayload),
    /// `dead` carries no payload; unknown kinds are preserved verbatim
    Opaque(Value),
}

impl SignalPayload {
    /// Decode a payload for the given kind.
    ///
    /// Unknown kinds (and `dead`) pass through as `Opaque`. Known kinds
    /// with malformed payloads are an error — the bus drops those with a
    /// log entry instead of guessing.
    pub fn decode(kind: &SignalKind, payload: Value) -> Result<SignalPayload, serde_json::Error> {
        Ok(match kind {
            SignalKind::Starting => SignalPayload::Starting(serde_json::from_value(payload)?),
            SignalKind::Working => SignalPayload::Working(serde_json::from_value(payload)?),
            SignalKind::Review => SignalPayload::Review(serde_json::from_value(payload)?),
            SignalKind::Reply => SignalPayload::Reply(serde_json::from_value(payload)?),
            SignalKind::Completing => SignalPayload::Completing(serde_json::from_value(payload)?),
            SignalKind::Complete => SignalPayload::Complete(serde_json::from_value(payload)?),
            SignalKind::Paused => SignalPayload::Paused(serde_json::from_value(payload)?),
            SignalKind::Dead | SignalKind::Unknown(_) => SignalPayload::Opaque(payload),
        })
    }

    /// Task id this payload references, if any.
    pub fn task(&self) -> Option<&TaskId> {
        match self {
            SignalPayload::Starting(p) => Some(&p.task),
            SignalPayload::Working(p) => Some(&p.task),
            SignalPayload::Review(p) => Some(&p.task),
            SignalPayload::Reply(p) => Some(&p.task),
            SignalPayload::Complete(p) => Some(&p.task_id),
            SignalPayload::Paused(p) => Some(&p.task),
            SignalPayload::Completing(_) | SignalPayload::Opaque(_) => None,
        }
    }

    /// Stable hash of the serialized payload, used by the bus dedup window.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        serde_json::to_string(self)
            .unwrap_or_default()
            .hash(&mut hasher);
        hasher.finish()
    }
}

/// Wire envelope for the signal ingestion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalEnvelope {
    pub kind: SignalKind,
    #[serde(default)]
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

/// A received signal with server-assigned ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub session: SessionName,
    pub kind: SignalKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskId>,
    pub payload: SignalPayload,
    /// Monotonic sequence assigned by the bus
    pub seq: u64,
    pub received_at_ms: u64,
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
