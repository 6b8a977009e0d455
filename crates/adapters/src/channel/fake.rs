// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake message channel for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ChannelError, ChannelMessage, MessageChannel};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// A reply posted through the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub thread: String,
    pub text: String,
}

struct FakeChannelState {
    channels: Vec<String>,
    pending: Vec<ChannelMessage>,
    sent: Vec<OutboundMessage>,
    unavailable: bool,
}

/// Fake channel with scriptable incoming messages.
#[derive(Clone)]
pub struct FakeChannel {
    inner: Arc<Mutex<FakeChannelState>>,
}

impl FakeChannel {
    pub fn new(channels: &[&str]) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeChannelState {
                channels: channels.iter().map(|c| c.to_string()).collect(),
                pending: Vec::new(),
                sent: Vec::new(),
                unavailable: false,
            })),
        }
    }

    /// Queue a message for the next `receive` call.
    pub fn push_incoming(&self, message: ChannelMessage) {
        self.inner.lock().pending.push(message);
    }

    /// Replies posted so far.
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.inner.lock().sent.clone()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().unavailable = unavailable;
    }
}

impl Default for FakeChannel {
    fn default() -> Self {
        Self::new(&["general"])
    }
}

#[async_trait]
impl MessageChannel for FakeChannel {
    async fn receive(&self) -> Result<Vec<ChannelMessage>, ChannelError> {
        let mut inner = self.inner.lock();
        if inner.unavailable {
            return Err(ChannelError::Unavailable("fake offline".into()));
        }
        Ok(std::mem::take(&mut inner.pending))
    }

    async fn send(&self, thread: &str, text: &str) -> Result<(), ChannelError> {
        let mut inner = self.inner.lock();
        if inner.unavailable {
            return Err(ChannelError::SendFailed("fake offline".into()));
        }
        inner.sent.push(OutboundMessage {
            thread: thread.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn list_channels(&self) -> Result<Vec<String>, ChannelError> {
        let inner = self.inner.lock();
        if inner.unavailable {
            return Err(ChannelError::Unavailable("fake offline".into()));
        }
        Ok(inner.channels.clone())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
