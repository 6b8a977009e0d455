// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generic message channel abstraction for the external bridge.
//!
//! Chat systems differ wildly; the core only needs three capabilities:
//! drain pending messages, post a reply into a thread, and enumerate the
//! channels it may watch.

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeChannel, OutboundMessage};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from channel operations
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel unavailable: {0}")]
    Unavailable(String),
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// One incoming message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// Channel the message arrived in
    pub channel: String,
    /// Conversation thread; replies share the thread of the original
    pub thread: String,
    pub author: String,
    pub text: String,
    pub sent_at_ms: u64,
    /// True when this message is a reply within an existing thread
    #[serde(default)]
    pub is_reply: bool,
}

/// Two-way connector to a chat system.
#[async_trait]
pub trait MessageChannel: Clone + Send + Sync + 'static {
    /// Drain messages that arrived since the last call.
    async fn receive(&self) -> Result<Vec<ChannelMessage>, ChannelError>;

    /// Post `text` into a conversation thread.
    async fn send(&self, thread: &str, text: &str) -> Result<(), ChannelError>;

    /// Channels this connector can see.
    async fn list_channels(&self) -> Result<Vec<String>, ChannelError>;
}
