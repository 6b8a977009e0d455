// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed exit codes.
//!
//! 0 success, 1 user error, 2 invalid state, 3 integrity failure.

use thiserror::Error;

/// An error that carries its process exit code.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ExitError {
    pub message: String,
    pub code: i32,
}

impl ExitError {
    pub fn user(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: 1,
        }
    }

    pub fn state(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: 2,
        }
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: 3,
        }
    }

    /// Map a gateway error kind to an exit code.
    pub fn from_kind(kind: &str, message: impl Into<String>) -> Self {
        match kind {
            "integrity" => Self::integrity(message),
            "conflict" | "invariant" | "task_closed" | "backend_unavailable" => {
                Self::state(message)
            }
            _ => Self::user(message),
        }
    }
}
