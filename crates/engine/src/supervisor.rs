// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session supervisor: one state machine per agent session.
//!
//! Spawns sessions into the terminal driver, advances state on signals,
//! handles pause/resume/kill, sweeps for stale sessions, and reconstructs
//! records after a restart. External requests are serialized through the
//! session table lock, so each session's state machine sees one command
//! at a time.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use squad_core::{
    Clock, CompletePayload, CoreConfig, NameGen, SessionName, SessionRecord, SessionState, Signal,
    SignalEnvelope, SignalKind, SignalPayload, Task, TaskId, TaskPatch, TaskStatus,
};
use squad_adapters::{NotifyAdapter, TerminalAdapter, TerminalError};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::rules::{ReviewAction, ReviewRules};
use crate::scheduler::{next_task, SchedulerView};
use crate::{EngineError, SignalBus, Stores};

/// What kind of session a spawn request starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpawnMode {
    Work,
    Chat,
    Plan,
}

/// Gateway-facing spawn request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskId>,
    pub mode: SpawnMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

const DEFAULT_PROGRAM: &str = "claude";
const DEFAULT_MODEL: &str = "default";
const CAPTURE_LINES: u32 = 80;

/// Per-project session supervisor.
pub struct Supervisor<T, N, C: Clock, G> {
    terminal: T,
    notify: N,
    clock: C,
    names: G,
    config: CoreConfig,
    project_root: PathBuf,
    stores: Arc<Stores>,
    bus: Arc<SignalBus<C>>,
    sessions: Mutex<HashMap<SessionName, SessionRecord>>,
}

impl<T, N, C, G> Supervisor<T, N, C, G>
where
    T: TerminalAdapter,
    N: NotifyAdapter,
    C: Clock,
    G: NameGen,
{
    pub fn new(
        terminal: T,
        notify: N,
        clock: C,
        names: G,
        config: CoreConfig,
        project_root: PathBuf,
        stores: Arc<Stores>,
        bus: Arc<SignalBus<C>>,
    ) -> Self {
        Self {
            terminal,
            notify,
            clock,
            names,
            config,
            project_root,
            stores,
            bus,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn bus(&self) -> &SignalBus<C> {
        &self.bus
    }

    /// Snapshot of all session records.
    pub fn sessions(&self) -> Vec<SessionRecord> {
        let mut records: Vec<SessionRecord> = self.sessions.lock().values().cloned().collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }

    pub fn session(&self, name: &str) -> Option<SessionRecord> {
        self.sessions.lock().get(name).cloned()
    }

    /// Sessions that still hold (or expect) a live terminal. The restore
    /// quiesce check counts these.
    pub fn live_session_count(&self) -> usize {
        self.sessions
            .lock()
            .values()
            .filter(|r| r.state.is_live())
            .count()
    }

    // --- spawn ------------------------------------------------------------

    /// Start a session: register the agent, claim a task, create the
    /// terminal.
    pub async fn spawn(&self, request: SpawnRequest) -> Result<SessionRecord, EngineError> {
        let now_ms = self.clock.epoch_ms();
        let program = request.program.as_deref().unwrap_or(DEFAULT_PROGRAM);
        let model = request.model.as_deref().unwrap_or(DEFAULT_MODEL);

        let agent = self.stores.agents.lock().register(
            request.agent.as_deref(),
            program,
            model,
            &self.names,
            now_ms,
        )?;

        let name = SessionName::compose(&self.config.session_prefix, &agent.name);
        {
            let sessions = self.sessions.lock();
            if let Some(existing) = sessions.get(&name) {
                if existing.state.is_live() || existing.state == SessionState::Paused {
                    return Err(EngineError::Conflict(format!(
                        "agent {} already has session {} in state {}",
                        agent.name, name, existing.state
                    )));
                }
            }
        }

        let task = match (&request.task, request.mode) {
            (Some(id), _) => Some(self.claim_task(id, &agent.name, now_ms)?),
            (None, SpawnMode::Work) => self.select_and_claim(&agent.name, now_ms)?,
            (None, _) => None,
        };

        let mut record = SessionRecord::new(name.clone(), agent.name.clone(), now_ms);
        record.task = task.as_ref().map(|t| t.id.clone());
        self.sessions.lock().insert(name.clone(), record.clone());

        let command = initial_command(program, request.mode, record.task.as_ref());
        match self
            .terminal
            .create(name.as_str(), &self.project_root, &command)
            .await
        {
            Ok(_) => {
                record.state = SessionState::Starting;
                self.sessions.lock().insert(name.clone(), record.clone());
                tracing::info!(session = name.as_str(), agent = %agent.name, "session spawned");
                Ok(record)
            }
            Err(TerminalError::NoBackend(reason)) => {
                // Refuse to spawn: undo the claim, forget the record
                self.sessions.lock().remove(&name);
                self.unclaim(task.as_ref(), now_ms);
                Err(EngineError::BackendUnavailable(reason))
            }
            Err(e) => {
                record.state = SessionState::Dead;
                self.sessions.lock().insert(name.clone(), record);
                self.release_reservations(&agent.name);
                self.unclaim(task.as_ref(), now_ms);
                Err(e.into())
            }
        }
    }

    fn claim_task(&self, id: &TaskId, agent: &str, now_ms: u64) -> Result<Task, EngineError> {
        let mut tasks = self.stores.tasks.lock();
        let task = tasks.show(id)?;
        if task.status.is_closed() {
            return Err(EngineError::InvariantViolation(format!(
                "task {id} is closed"
            )));
        }
        if let Some(assigned) = task.assignee.as_deref() {
            if assigned != agent && task.status == TaskStatus::InProgress {
                return Err(EngineError::Conflict(format!(
                    "task {id} is in progress under {assigned}"
                )));
            }
        }
        let patch = TaskPatch {
            assignee: Some(Some(agent.to_string())),
            status: Some(TaskStatus::InProgress),
            ..Default::default()
        };
        Ok(tasks.update(id, patch, now_ms)?)
    }

    /// Scheduler selection and claim under one store critical section.
    fn select_and_claim(&self, agent: &str, now_ms: u64) -> Result<Option<Task>, EngineError> {
        let mut tasks = self.stores.tasks.lock();
        let snapshot = tasks.snapshot();
        let reservations = self.stores.ledger.list(None);
        let view = SchedulerView {
            tasks: &snapshot,
            reservations: &reservations,
        };
        match next_task(&view, agent) {
            Some(picked) => {
                let patch = TaskPatch {
                    assignee: Some(Some(agent.to_string())),
                    status: Some(TaskStatus::InProgress),
                    ..Default::default()
                };
                Ok(Some(tasks.update(&picked.id, patch, now_ms)?))
            }
            None => Ok(None),
        }
    }

    fn unclaim(&self, task: Option<&Task>, now_ms: u64) {
        if let Some(task) = task {
            let patch = TaskPatch {
                assignee: Some(None),
                status: Some(TaskStatus::Open),
                ..Default::default()
            };
            if let Err(e) = self.stores.tasks.lock().update(&task.id, patch, now_ms) {
                tracing::warn!(task = %task.id, error = %e, "failed to unclaim task");
            }
        }
    }

    fn release_reservations(&self, agent: &str) {
        match self.stores.ledger.release_agent(agent) {
            Ok(released) if released > 0 => {
                tracing::info!(agent, released, "reservations released");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(agent, error = %e, "reservation release failed"),
        }
    }

    // --- signals ----------------------------------------------------------

    /// Advance the state machine for an accepted signal.
    ///
    /// The bus has already deduplicated and sequenced it. Signal handling
    /// never rewinds state: malformed or unexpected signals are absorbed.
    pub async fn apply_signal(&self, signal: &Signal) -> Result<(), EngineError> {
        let name = signal.session.clone();
        let now_ms = signal.received_at_ms;

        let (agent, transition) = {
            let mut sessions = self.sessions.lock();
            if !sessions.contains_key(name.as_str()) {
                // A signal for a session this supervisor never spawned:
                // accept it if the name carries our prefix (restart gap),
                // otherwise drop.
                match self.implicit_record(&name, now_ms) {
                    Some(record) => {
                        sessions.insert(name.clone(), record);
                    }
                    None => {
                        tracing::warn!(session = name.as_str(), "signal for unknown session dropped");
                        return Ok(());
                    }
                }
            }
            let Some(record) = sessions.get_mut(name.as_str()) else {
                return Ok(());
            };

            record.last_signal_at_ms = now_ms;
            if record.task.is_none() {
                record.task = signal.task.clone();
            }
            let transition = record.state.on_signal(&signal.kind);
            if let Some(next) = transition {
                tracing::info!(
                    session = name.as_str(),
                    from = %record.state,
                    to = %next,
                    kind = %signal.kind,
                    "session state advanced"
                );
                record.state = next;
            }
            (record.agent.clone(), transition)
        };

        // Durable latest per (session, kind); agent liveness
        if let Err(e) = self.stores.signals.lock().record(signal) {
            tracing::warn!(error = %e, "latest-signal record failed");
        }
        if let Err(e) = self.stores.agents.lock().touch(&agent, now_ms) {
            tracing::debug!(agent, error = %e, "registry touch skipped");
        }

        match transition {
            Some(SessionState::Review) => {
                let _ = self
                    .notify
                    .notify(&format!("{agent} awaits review"), &review_body(signal))
                    .await;
            }
            Some(SessionState::Paused) => {
                // Agent announced its own pause; make sure the terminal is gone
                if let Err(e) = self.terminal.kill(name.as_str()).await {
                    tracing::debug!(session = name.as_str(), error = %e, "kill after paused signal");
                }
            }
            Some(SessionState::Dead) => {
                self.release_reservations(&agent);
            }
            Some(SessionState::Complete) => {
                if let SignalPayload::Complete(payload) = &signal.payload {
                    self.handle_completion(&name, &agent, payload, now_ms).await?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn implicit_record(&self, name: &SessionName, now_ms: u64) -> Option<SessionRecord> {
        let agent = name.as_str().strip_prefix(&self.config.session_prefix)?;
        let mut record = SessionRecord::new(name.clone(), agent, now_ms);
        record.state = SessionState::Starting;
        Some(record)
    }

    /// Review-vs-auto-proceed on a completion bundle.
    async fn handle_completion(
        &self,
        name: &SessionName,
        agent: &str,
        payload: &CompletePayload,
        now_ms: u64,
    ) -> Result<(), EngineError> {
        // The completion protocol closes the task before the bundle is
        // emitted; close here only if that step went missing.
        {
            let mut tasks = self.stores.tasks.lock();
            match tasks.show(&payload.task_id) {
                Ok(task) if !task.status.is_closed() => {
                    if let Err(e) = tasks.close(&payload.task_id, true, now_ms) {
                        tracing::warn!(task = %payload.task_id, error = %e, "close on completion failed");
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(task = %payload.task_id, error = %e, "completed task missing"),
            }
        }

        self.release_reservations(agent);

        if !payload.human_actions.is_empty() {
            let body = payload.human_actions.join("; ");
            let _ = self
                .notify
                .notify(&format!("{} needs follow-up", payload.task_id), &body)
                .await;
        }

        let decision = self.resolve_review(&payload.task_id);
        if decision != ReviewAction::Auto {
            return Ok(());
        }
        match self.select_and_claim(agent, now_ms)? {
            Some(next) => {
                tracing::info!(agent, next = %next.id, "auto-proceeding to next task");
                self.terminal.kill(name.as_str()).await.ok();
                let mut record = SessionRecord::new(name.clone(), agent, self.clock.epoch_ms());
                record.task = Some(next.id.clone());
                let program = self
                    .stores
                    .agents
                    .lock()
                    .get(agent)
                    .map(|a| a.program.clone())
                    .unwrap_or_else(|| DEFAULT_PROGRAM.to_string());
                let command = initial_command(&program, SpawnMode::Work, Some(&next.id));
                match self
                    .terminal
                    .create(name.as_str(), &self.project_root, &command)
                    .await
                {
                    Ok(_) => {
                        record.state = SessionState::Starting;
                        self.sessions.lock().insert(name.clone(), record);
                    }
                    Err(e) => {
                        tracing::warn!(session = name.as_str(), error = %e, "auto-proceed spawn failed");
                        record.state = SessionState::Dead;
                        self.sessions.lock().insert(name.clone(), record);
                        self.unclaim(Some(&next), now_ms);
                    }
                }
            }
            None => {
                tracing::info!(agent, "auto-proceed: no ready task, staying complete");
            }
        }
        Ok(())
    }

    /// Policy decision for a completed task. The bundle's own
    /// completionMode is recorded but policy wins.
    fn resolve_review(&self, task_id: &TaskId) -> ReviewAction {
        let rules_path = self.stores.state_dir().join("review-rules.json");
        let rules = match ReviewRules::load(&rules_path) {
            Ok(rules) => rules,
            Err(e) => {
                tracing::warn!(error = %e, "review rules unreadable, defaulting to review");
                return ReviewAction::Review;
            }
        };
        let env_default = self
            .config
            .review_default
            .as_deref()
            .and_then(ReviewAction::parse);

        let tasks = self.stores.tasks.lock();
        let task = match tasks.show(task_id) {
            Ok(task) => task,
            Err(_) => return ReviewAction::Review,
        };
        let session_override = task
            .parent
            .as_ref()
            .and_then(|parent| tasks.show(parent).ok())
            .filter(|parent| parent.is_epic())
            .and_then(|parent| notes_action(&parent.notes));
        rules.resolve(&task, session_override, env_default)
    }

    // --- explicit RPCs ----------------------------------------------------

    /// Pause: record the task, kill the terminal, keep the assignment.
    pub async fn pause(&self, name: &str) -> Result<SessionRecord, EngineError> {
        {
            let mut sessions = self.sessions.lock();
            let record = sessions
                .get_mut(name)
                .ok_or_else(|| EngineError::NotFound(format!("session {name}")))?;
            if !record.state.is_live() {
                return Err(EngineError::InvariantViolation(format!(
                    "session {name} is {} and cannot pause",
                    record.state
                )));
            }
            record.state = SessionState::Paused;
            record.last_signal_at_ms = self.clock.epoch_ms();
        }
        // Kill synchronously; the pause API returns once the terminal is gone
        if let Err(e) = self.terminal.kill(name).await {
            tracing::warn!(session = name, error = %e, "terminal kill during pause");
        }
        self.session(name)
            .ok_or_else(|| EngineError::NotFound(format!("session {name}")))
    }

    /// Resume a paused session: recreate the terminal under the same name
    /// and inject the seeded context as keystrokes.
    pub async fn resume(&self, name: &str, message: Option<&str>) -> Result<SessionRecord, EngineError> {
        let (session_name, agent, task_id) = {
            let sessions = self.sessions.lock();
            let record = sessions
                .get(name)
                .ok_or_else(|| EngineError::NotFound(format!("session {name}")))?;
            if record.state != SessionState::Paused {
                return Err(EngineError::InvariantViolation(format!(
                    "session {name} is {} and cannot resume",
                    record.state
                )));
            }
            (record.name.clone(), record.agent.clone(), record.task.clone())
        };

        let task = match &task_id {
            Some(id) => {
                let task = self.stores.tasks.lock().show(id)?;
                if task.status.is_closed() {
                    return Err(EngineError::TaskClosed(id.clone()));
                }
                Some(task)
            }
            None => None,
        };

        let program = self
            .stores
            .agents
            .lock()
            .get(&agent)
            .map(|a| a.program.clone())
            .unwrap_or_else(|| DEFAULT_PROGRAM.to_string());
        let command = initial_command(&program, SpawnMode::Work, task_id.as_ref());
        self.terminal
            .create(name, &self.project_root, &command)
            .await?;

        let text = message.unwrap_or("resume");
        self.terminal.send_text(name, text).await?;
        self.terminal
            .send_key(name, squad_adapters::Key::Enter)
            .await?;

        {
            let mut sessions = self.sessions.lock();
            if let Some(record) = sessions.get_mut(name) {
                record.state = SessionState::Working;
                record.last_signal_at_ms = self.clock.epoch_ms();
            }
        }

        // Subscribers observe the resume as a working signal
        if let Some(task) = &task {
            let envelope = SignalEnvelope {
                kind: SignalKind::Working,
                payload: json!({
                    "task": task.id,
                    "title": task.title,
                    "approach": "resumed after pause",
                }),
                timestamp: None,
            };
            match self.bus.publish(&session_name, envelope) {
                Ok(Some(signal)) => {
                    if let Err(e) = self.stores.signals.lock().record(&signal) {
                        tracing::warn!(error = %e, "latest-signal record failed");
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "resume signal publish failed"),
            }
        }

        self.session(name)
            .ok_or_else(|| EngineError::NotFound(format!("session {name}")))
    }

    /// Kill: terminal gone, reservations released, record dead. Idempotent.
    pub async fn kill(&self, name: &str) -> Result<(), EngineError> {
        if let Err(e) = self.terminal.kill(name).await {
            tracing::debug!(session = name, error = %e, "terminal kill");
        }
        let agent = {
            let mut sessions = self.sessions.lock();
            match sessions.get_mut(name) {
                Some(record) => {
                    record.state = SessionState::Dead;
                    Some(record.agent.clone())
                }
                None => None,
            }
        };
        if let Some(agent) = agent {
            self.release_reservations(&agent);
        }
        Ok(())
    }

    // --- maintenance ------------------------------------------------------

    /// Heartbeat sweep plus complete-grace cleanup.
    ///
    /// Sessions in starting/working/review silent past the stale timeout
    /// are checked against the driver; no underlying terminal means dead.
    /// Complete sessions past the grace period are destroyed.
    pub async fn sweep(&self) -> Result<Vec<SessionName>, EngineError> {
        let now_ms = self.clock.epoch_ms();
        let stale_ms = self.config.stale_timeout.as_millis() as u64;
        let grace_ms = self.config.complete_grace.as_millis() as u64;

        let candidates: Vec<SessionRecord> = self.sessions.lock().values().cloned().collect();
        let mut died = Vec::new();

        for record in candidates {
            let silent_ms = now_ms.saturating_sub(record.last_signal_at_ms);
            let name = record.name.as_str();

            if record.state.heartbeat_monitored() && silent_ms >= stale_ms {
                match self.terminal.exists(name).await {
                    Ok(true) => {
                        // Pane is alive, just quiet; refresh the tail
                        if let Ok(capture) = self.terminal.capture_tail(name, CAPTURE_LINES).await {
                            let mut sessions = self.sessions.lock();
                            if let Some(record) = sessions.get_mut(name) {
                                record.output_tail.extend_from_capture(&capture);
                            }
                        }
                    }
                    Ok(false) => {
                        tracing::warn!(session = name, silent_ms, "stale session has no terminal");
                        {
                            let mut sessions = self.sessions.lock();
                            if let Some(record) = sessions.get_mut(name) {
                                record.state = SessionState::Dead;
                            }
                        }
                        self.release_reservations(&record.agent);
                        died.push(record.name.clone());
                    }
                    Err(TerminalError::NoBackend(_)) => {
                        // Cannot check liveness without a backend; leave as-is
                    }
                    Err(e) => {
                        tracing::debug!(session = name, error = %e, "liveness check failed");
                    }
                }
            } else if record.state == SessionState::Complete && silent_ms >= grace_ms {
                tracing::info!(session = name, "complete session past grace, destroying");
                self.terminal.kill(name).await.ok();
                self.sessions.lock().remove(name);
            }
        }
        Ok(died)
    }

    /// Restart recovery: rebuild session records from the durable latest
    /// signals and the terminals actually alive.
    pub async fn recover(&self) -> Result<usize, EngineError> {
        let live: Vec<String> = match self.terminal.list().await {
            Ok(live) => live,
            Err(TerminalError::NoBackend(reason)) => {
                tracing::warn!(reason, "recovery without terminal backend");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        let prefix = &self.config.session_prefix;
        let mut names: Vec<String> = self.stores.signals.lock().sessions();
        for name in &live {
            if name.starts_with(prefix.as_str()) && !names.contains(name) {
                names.push(name.clone());
            }
        }

        let now_ms = self.clock.epoch_ms();
        let mut recovered = 0;
        for name in names {
            let Some(agent) = name.strip_prefix(prefix.as_str()).map(str::to_string) else {
                continue;
            };
            let session_name = SessionName::new(&name);
            let retained = self.stores.signals.lock().for_session(&name);
            let inferred = retained
                .iter()
                .filter_map(|s| kind_state(&s.kind).map(|state| (s.seq, state, s.clone())))
                .max_by_key(|(seq, _, _)| *seq);

            let mut record = SessionRecord::new(session_name.clone(), agent, now_ms);
            let terminal_alive = live.contains(&name);
            let (state, latest) = match inferred {
                Some((_, state, signal)) => (state, Some(signal)),
                None => (SessionState::Starting, None),
            };
            record.state = match (terminal_alive, state) {
                (true, state) if state.is_live() => state,
                (true, SessionState::Complete) => SessionState::Complete,
                // A pane that outlived a paused/dead record is live work again
                (true, _) => SessionState::Working,
                // No terminal: paused and finished states survive as-is,
                // anything that should have a pane is dead.
                (false, SessionState::Paused) => SessionState::Paused,
                (false, SessionState::Complete) => SessionState::Complete,
                (false, _) => SessionState::Dead,
            };
            if let Some(latest) = latest {
                record.task = latest.task.clone().or(record.task);
                record.last_signal_at_ms = latest.received_at_ms;
            }

            tracing::info!(
                session = name,
                state = %record.state,
                terminal_alive,
                "session record reconstructed"
            );
            self.sessions.lock().insert(session_name, record);
            recovered += 1;
        }
        Ok(recovered)
    }
}

/// Map a signal kind to the session state it evidences.
fn kind_state(kind: &SignalKind) -> Option<SessionState> {
    match kind {
        SignalKind::Starting => Some(SessionState::Starting),
        SignalKind::Working => Some(SessionState::Working),
        SignalKind::Review => Some(SessionState::Review),
        SignalKind::Completing => Some(SessionState::Completing),
        SignalKind::Complete => Some(SessionState::Complete),
        SignalKind::Paused => Some(SessionState::Paused),
        SignalKind::Dead => Some(SessionState::Dead),
        SignalKind::Reply | SignalKind::Unknown(_) => None,
    }
}

fn notes_action(notes: &str) -> Option<ReviewAction> {
    if notes.contains("review:always") {
        Some(ReviewAction::Review)
    } else if notes.contains("review:auto") {
        Some(ReviewAction::Auto)
    } else {
        None
    }
}

fn review_body(signal: &Signal) -> String {
    match &signal.payload {
        SignalPayload::Review(payload) => {
            if payload.summary.is_empty() {
                format!("task {}", payload.task)
            } else {
                payload.summary.join("; ")
            }
        }
        _ => "review ready".to_string(),
    }
}

fn initial_command(program: &str, mode: SpawnMode, task: Option<&TaskId>) -> String {
    let mut command = program.to_string();
    match mode {
        SpawnMode::Work => {
            if let Some(task) = task {
                command.push_str(&format!(" --task {task}"));
            }
        }
        SpawnMode::Chat => command.push_str(" --chat"),
        SpawnMode::Plan => command.push_str(" --plan"),
    }
    command
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
