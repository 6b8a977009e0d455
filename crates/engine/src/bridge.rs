// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External channel bridge.
//!
//! Ingest: new messages in watched channels become chat tasks; replies
//! append to the originating task and resume its paused session. Outbound:
//! `reply` signals for tasks with a known thread are posted back into the
//! channel.

use parking_lot::Mutex;
use squad_core::{
    Clock, IssueType, NameGen, Signal, SignalPayload, Task, TaskId,
};
use squad_adapters::{ChannelMessage, MessageChannel, NotifyAdapter, TerminalAdapter};
use squad_storage::TaskSpec;
use std::collections::HashMap;
use std::sync::Arc;

use crate::supervisor::Supervisor;
use crate::{EngineError, Stores};

/// Fixed preamble injected when a chat reply resumes a paused session.
const REPLY_PREAMBLE: &str = "the user replied: ";

fn thread_label(thread: &str) -> String {
    format!("thread:{thread}")
}

fn origin_label(channel: &str) -> String {
    format!("origin:{channel}")
}

/// Two-way connector between a message channel and the core.
pub struct ChannelBridge<M, T, N, C: Clock, G> {
    channel: M,
    watched: Vec<String>,
    clock: C,
    stores: Arc<Stores>,
    supervisor: Arc<Supervisor<T, N, C, G>>,
    /// thread -> originating task, rebuilt from task labels at startup
    threads: Mutex<HashMap<String, TaskId>>,
}

impl<M, T, N, C, G> ChannelBridge<M, T, N, C, G>
where
    M: MessageChannel,
    T: TerminalAdapter,
    N: NotifyAdapter,
    C: Clock,
    G: NameGen,
{
    pub fn new(
        channel: M,
        watched: Vec<String>,
        clock: C,
        stores: Arc<Stores>,
        supervisor: Arc<Supervisor<T, N, C, G>>,
    ) -> Self {
        let bridge = Self {
            channel,
            watched,
            clock,
            stores,
            supervisor,
            threads: Mutex::new(HashMap::new()),
        };
        bridge.rebuild_thread_index();
        bridge
    }

    /// Recover the thread map from task labels after a restart.
    fn rebuild_thread_index(&self) {
        let tasks = self.stores.tasks.lock().snapshot();
        let mut threads = self.threads.lock();
        for task in tasks {
            for label in &task.labels {
                if let Some(thread) = label.strip_prefix("thread:") {
                    threads.insert(thread.to_string(), task.id.clone());
                }
            }
        }
    }

    /// Drain the channel and apply the ingest rules. Returns the tasks
    /// created for brand-new threads.
    pub async fn ingest_pending(&self) -> Result<Vec<Task>, EngineError> {
        let messages = self
            .channel
            .receive()
            .await
            .map_err(|e| EngineError::BackendUnavailable(e.to_string()))?;

        let mut created = Vec::new();
        for message in messages {
            if !self.watched.contains(&message.channel) {
                continue;
            }
            let existing = self.threads.lock().get(&message.thread).cloned();
            match existing {
                Some(task_id) => self.apply_follow_up(&task_id, &message).await?,
                None => created.push(self.ingest_new(&message)?),
            }
        }
        Ok(created)
    }

    /// A new conversation becomes a chat task with a reply template.
    fn ingest_new(&self, message: &ChannelMessage) -> Result<Task, EngineError> {
        let now_ms = self.clock.epoch_ms();
        let description = format!(
            "From {} in #{} (thread {}):\n\n{}\n\n\
             Reply template: answer in-thread; emit a `reply` signal with \
             replyType ack|answer|progress|completion.",
            message.author, message.channel, message.thread, message.text
        );
        let spec = TaskSpec {
            title: chat_title(&message.text),
            description,
            issue_type: Some(IssueType::Chat),
            labels: [
                origin_label(&message.channel),
                thread_label(&message.thread),
            ]
            .into_iter()
            .collect(),
            ..Default::default()
        };
        let task = self.stores.tasks.lock().create(spec, now_ms)?;
        self.threads
            .lock()
            .insert(message.thread.clone(), task.id.clone());
        tracing::info!(task = %task.id, thread = message.thread, "chat task ingested");
        Ok(task)
    }

    /// A reply on a known thread: append a follow-up, and resume the
    /// session if the task's agent is paused on it.
    async fn apply_follow_up(
        &self,
        task_id: &TaskId,
        message: &ChannelMessage,
    ) -> Result<(), EngineError> {
        let now_ms = self.clock.epoch_ms();
        {
            let mut tasks = self.stores.tasks.lock();
            let task = tasks.show(task_id)?;
            let mut description = task.description;
            description.push_str(&format!(
                "\n\n--- follow-up from {} at {} ---\n{}",
                message.author, message.sent_at_ms, message.text
            ));
            let patch = squad_core::TaskPatch {
                description: Some(description),
                ..Default::default()
            };
            tasks.update(task_id, patch, now_ms)?;
        }

        if let Some(session) = self.paused_session_for(task_id) {
            let inject = format!("{REPLY_PREAMBLE}{}", message.text);
            tracing::info!(task = %task_id, session, "reply resumes paused session");
            self.supervisor.resume(&session, Some(&inject)).await?;
        }
        Ok(())
    }

    fn paused_session_for(&self, task_id: &TaskId) -> Option<String> {
        self.supervisor
            .sessions()
            .into_iter()
            .find(|record| {
                record.state == squad_core::SessionState::Paused
                    && record.task.as_ref() == Some(task_id)
            })
            .map(|record| record.name.as_str().to_string())
    }

    /// Forward an outbound `reply` signal into its thread, if known.
    pub async fn forward_reply(&self, signal: &Signal) -> Result<bool, EngineError> {
        let SignalPayload::Reply(payload) = &signal.payload else {
            return Ok(false);
        };
        let thread = {
            let threads = self.threads.lock();
            threads
                .iter()
                .find(|(_, task)| *task == &payload.task)
                .map(|(thread, _)| thread.clone())
        };
        match thread {
            Some(thread) => {
                self.channel
                    .send(&thread, &payload.message)
                    .await
                    .map_err(|e| EngineError::BackendUnavailable(e.to_string()))?;
                Ok(true)
            }
            None => {
                tracing::debug!(task = %payload.task, "reply for task without a thread");
                Ok(false)
            }
        }
    }

    /// Channels the connector can see (gateway diagnostics).
    pub async fn channels(&self) -> Result<Vec<String>, EngineError> {
        self.channel
            .list_channels()
            .await
            .map_err(|e| EngineError::BackendUnavailable(e.to_string()))
    }
}

/// First line of the message, clipped, as the task title.
fn chat_title(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or("chat");
    let mut title = first_line.trim().to_string();
    if title.is_empty() {
        title = "chat".to_string();
    }
    if title.len() > 72 {
        title.truncate(72);
    }
    title
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
