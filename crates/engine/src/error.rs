// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error kinds.
//!
//! One variant per error kind from the propagation contract; each carries a
//! short reason string. The gateway translates kinds to HTTP codes.

use squad_core::{TaskError, TaskId};
use squad_storage::{RegistryError, StoreError, TaskStoreError};
use thiserror::Error;

/// Error kinds surfaced by the engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed input: bad id, cycle, unknown enum. Never retried.
    #[error("validation: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Reservation or concurrent-modify conflict. Caller decides retry.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The operation would break an invariant. Rolled back.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Terminal multiplexer absent or unresponsive.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A persisted store failed a consistency check.
    #[error("integrity: {0}")]
    Integrity(String),

    /// Resume rejected because the recorded task was closed externally.
    #[error("task closed: {0}")]
    TaskClosed(TaskId),

    #[error("internal: {0}")]
    Internal(String),
}

impl From<TaskStoreError> for EngineError {
    fn from(e: TaskStoreError) -> Self {
        match e {
            TaskStoreError::NotFound(id) => EngineError::NotFound(format!("task {id}")),
            TaskStoreError::UnknownDependency(id) => {
                EngineError::Validation(format!("unknown dependency {id}"))
            }
            TaskStoreError::DependencyCycle { from, to } => {
                EngineError::Validation(format!("dependency cycle {from} -> {to}"))
            }
            TaskStoreError::ParentClosed(id) => {
                EngineError::InvariantViolation(format!("parent {id} is closed"))
            }
            TaskStoreError::OpenDependencies { id, open } => EngineError::InvariantViolation(
                format!("cannot close {id}: open dependencies {open:?}"),
            ),
            TaskStoreError::NotClosed(id) => {
                EngineError::InvariantViolation(format!("task {id} is not closed"))
            }
            TaskStoreError::Task(task) => task.into(),
            TaskStoreError::Store(store) => store.into(),
        }
    }
}

impl From<TaskError> for EngineError {
    fn from(e: TaskError) -> Self {
        match e {
            TaskError::InvalidTransition { .. } | TaskError::AssigneeRequired => {
                EngineError::InvariantViolation(e.to_string())
            }
            _ => EngineError::Validation(e.to_string()),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Integrity { .. } => EngineError::Integrity(e.to_string()),
            other => EngineError::Internal(other.to_string()),
        }
    }
}

impl From<RegistryError> for EngineError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NotFound(name) => EngineError::NotFound(format!("agent {name}")),
            RegistryError::NamesExhausted => EngineError::Conflict(e.to_string()),
            RegistryError::Store(store) => store.into(),
        }
    }
}

impl From<squad_adapters::TerminalError> for EngineError {
    fn from(e: squad_adapters::TerminalError) -> Self {
        match e {
            squad_adapters::TerminalError::NoBackend(reason) => {
                EngineError::BackendUnavailable(reason)
            }
            squad_adapters::TerminalError::NotFound(name) => {
                EngineError::NotFound(format!("session {name}"))
            }
            squad_adapters::TerminalError::CommandFailed(reason) => EngineError::Internal(reason),
        }
    }
}
