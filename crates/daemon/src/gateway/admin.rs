// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status, reservations, agents, and backup handlers.

use super::{engine_err, ok, AppState, Deps, GatewayResult};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use squad_core::{canonicalize_path, Clock, TaskId};
use squad_engine::EngineError;
use squad_storage::{
    AcquireOutcome, AgentRegistry, BackupError, Backups, TaskStore, VerifyOutcome,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// `GET /status`
pub async fn status<D: Deps>(State(state): State<Arc<AppState<D>>>) -> GatewayResult {
    let now_ms = state.clock.epoch_ms();
    let tasks = state.stores.tasks.lock();
    ok(json!({
        "status": "running",
        "uptime_ms": now_ms.saturating_sub(state.started_at_ms),
        "tasks": tasks.len(),
        "ready": tasks.ready().len(),
        "sessions": state.supervisor.sessions().len(),
        "live_sessions": state.supervisor.live_session_count(),
        "last_signal_seq": state.bus.last_seq(),
        "dropped_malformed_signals": state.bus.dropped_malformed(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct AcquireBody {
    pub path: String,
    pub agent: String,
    pub task: TaskId,
}

/// `POST /reservations` — acquire a file reservation. Paths are
/// canonicalized against the project root before keying.
pub async fn acquire<D: Deps>(
    State(state): State<Arc<AppState<D>>>,
    Json(body): Json<AcquireBody>,
) -> GatewayResult {
    let now_ms = state.clock.epoch_ms();
    let path = canonicalize_path(project_root(&state), &body.path);
    let outcome = state
        .stores
        .ledger
        .acquire(&path, &body.agent, &body.task, now_ms)
        .map_err(engine_err)?;
    match outcome {
        AcquireOutcome::Acquired => ok(json!({"acquired": true})),
        AcquireOutcome::Conflict { existing_agent } => Ok((
            StatusCode::CONFLICT,
            Json(json!({"acquired": false, "existingAgent": existing_agent})),
        )
            .into_response()),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReservationQuery {
    #[serde(default)]
    pub agent: Option<String>,
}

/// `GET /reservations?agent=`
pub async fn list_reservations<D: Deps>(
    State(state): State<Arc<AppState<D>>>,
    Query(query): Query<ReservationQuery>,
) -> GatewayResult {
    ok(state.stores.ledger.list(query.agent.as_deref()))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReleaseBody {
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// `POST /reservations/release` — release by agent or by path.
pub async fn release<D: Deps>(
    State(state): State<Arc<AppState<D>>>,
    Json(body): Json<ReleaseBody>,
) -> GatewayResult {
    match (body.agent, body.path) {
        (Some(agent), _) => {
            let released = state.stores.ledger.release_agent(&agent).map_err(engine_err)?;
            ok(json!({"released": released}))
        }
        (None, Some(path)) => {
            let path = canonicalize_path(project_root(&state), &path);
            let released = state.stores.ledger.release_path(&path).map_err(engine_err)?;
            ok(json!({"released": if released {1} else {0}}))
        }
        (None, None) => Err(engine_err(EngineError::Validation(
            "release needs agent or path".into(),
        ))),
    }
}

/// `GET /agents`
pub async fn list_agents<D: Deps>(State(state): State<Arc<AppState<D>>>) -> GatewayResult {
    ok(state.stores.agents.lock().all())
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default = "default_recent_minutes")]
    pub minutes: u64,
}

fn default_recent_minutes() -> u64 {
    60
}

/// `GET /agents/recent?minutes=`
pub async fn recent_agents<D: Deps>(
    State(state): State<Arc<AppState<D>>>,
    Query(query): Query<RecentQuery>,
) -> GatewayResult {
    let now_ms = state.clock.epoch_ms();
    ok(state
        .stores
        .agents
        .lock()
        .recent(Duration::from_secs(query.minutes * 60), now_ms))
}

#[derive(Debug, Deserialize)]
pub struct PurgeBody {
    pub days: u64,
}

/// `POST /agents/purge` — drop agents not seen within the window.
pub async fn purge_agents<D: Deps>(
    State(state): State<Arc<AppState<D>>>,
    Json(body): Json<PurgeBody>,
) -> GatewayResult {
    let now_ms = state.clock.epoch_ms();
    let removed = state
        .stores
        .agents
        .lock()
        .purge(Duration::from_secs(body.days * 86_400), now_ms)
        .map_err(engine_err)?;
    ok(json!({"removed": removed}))
}

#[derive(Debug, Default, Deserialize)]
pub struct BackupBody {
    #[serde(default)]
    pub label: Option<String>,
}

/// `POST /backup`
pub async fn backup<D: Deps>(
    State(state): State<Arc<AppState<D>>>,
    body: Option<Json<BackupBody>>,
) -> GatewayResult {
    let label = body.and_then(|Json(b)| b.label);
    let backups = Backups::new(state.stores.state_dir());
    let info = backups
        .backup(label.as_deref())
        .map_err(backup_err)?;
    ok(json!({"dir": info.dir, "label": info.label}))
}

#[derive(Debug, Deserialize)]
pub struct RestoreBody {
    pub dir: PathBuf,
    #[serde(default)]
    pub force: bool,
}

/// `POST /restore` — requires the core quiesced unless forced.
pub async fn restore<D: Deps>(
    State(state): State<Arc<AppState<D>>>,
    Json(body): Json<RestoreBody>,
) -> GatewayResult {
    let backups = Backups::new(state.stores.state_dir());
    match backups.verify(&body.dir).map_err(backup_err)? {
        VerifyOutcome::Ok => {}
        VerifyOutcome::Mismatch { file } => {
            return Err(engine_err(EngineError::Integrity(format!(
                "backup digest mismatch on {file}"
            ))));
        }
    }
    let live = state.supervisor.live_session_count();
    let safety = backups
        .restore(&body.dir, live, body.force)
        .map_err(backup_err)?;

    // Swap the in-memory images for the restored documents
    let state_dir = state.stores.state_dir().to_owned();
    {
        let mut tasks = state.stores.tasks.lock();
        let project = tasks.project().to_string();
        *tasks = TaskStore::open(&state_dir.join("tasks.db"), &project).map_err(engine_err)?;
    }
    {
        let mut agents = state.stores.agents.lock();
        *agents = AgentRegistry::open(&state_dir.join("agents.db")).map_err(engine_err)?;
    }

    ok(json!({"restored": body.dir, "safety_backup": safety.dir}))
}

/// The project root is the parent of the state directory.
fn project_root<D: Deps>(state: &AppState<D>) -> &std::path::Path {
    state
        .stores
        .state_dir()
        .parent()
        .unwrap_or_else(|| state.stores.state_dir())
}

fn backup_err(e: BackupError) -> axum::response::Response {
    let mapped = match e {
        BackupError::NotQuiesced(n) => {
            EngineError::Conflict(format!("{n} live sessions, restore refused"))
        }
        BackupError::DigestMismatch { file } => {
            EngineError::Integrity(format!("digest mismatch on {file}"))
        }
        BackupError::NotABackup(dir) => {
            EngineError::Validation(format!("not a backup directory: {}", dir.display()))
        }
        other => EngineError::Internal(other.to_string()),
    };
    super::error_response(mapped)
}
