// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session handlers.

use super::{created, engine_err, ok, AppState, Deps, GatewayResult};
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use squad_engine::{EngineError, SpawnRequest};
use std::sync::Arc;

/// `POST /work/spawn`
pub async fn spawn<D: Deps>(
    State(state): State<Arc<AppState<D>>>,
    Json(request): Json<SpawnRequest>,
) -> GatewayResult {
    let record = state
        .supervisor
        .spawn(request)
        .await
        .map_err(super::error_response)?;
    created(record)
}

/// `GET /sessions`
pub async fn list<D: Deps>(State(state): State<Arc<AppState<D>>>) -> GatewayResult {
    ok(state.supervisor.sessions())
}

/// `GET /sessions/{name}`
pub async fn show<D: Deps>(
    State(state): State<Arc<AppState<D>>>,
    Path(name): Path<String>,
) -> GatewayResult {
    match state.supervisor.session(&name) {
        Some(record) => ok(record),
        None => Err(engine_err(EngineError::NotFound(format!("session {name}")))),
    }
}

/// `POST /sessions/{name}/pause`
pub async fn pause<D: Deps>(
    State(state): State<Arc<AppState<D>>>,
    Path(name): Path<String>,
) -> GatewayResult {
    let record = state
        .supervisor
        .pause(&name)
        .await
        .map_err(super::error_response)?;
    ok(record)
}

#[derive(Debug, Default, Deserialize)]
pub struct ResumeBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// `POST /sessions/{name}/resume`
pub async fn resume<D: Deps>(
    State(state): State<Arc<AppState<D>>>,
    Path(name): Path<String>,
    body: Option<Json<ResumeBody>>,
) -> GatewayResult {
    let message = body.and_then(|Json(b)| b.message);
    let record = state
        .supervisor
        .resume(&name, message.as_deref())
        .await
        .map_err(super::error_response)?;
    ok(record)
}

/// `POST /sessions/{name}/attach` — hint for opening the session in a
/// viewer; returns the command a terminal can run.
pub async fn attach<D: Deps>(
    State(state): State<Arc<AppState<D>>>,
    Path(name): Path<String>,
) -> GatewayResult {
    match state.supervisor.session(&name) {
        Some(record) => ok(serde_json::json!({
            "session": record.name,
            "command": format!("tmux attach -t {}", record.name),
        })),
        None => Err(engine_err(EngineError::NotFound(format!("session {name}")))),
    }
}

/// `DELETE /sessions/{name}` — kill, idempotent.
pub async fn kill<D: Deps>(
    State(state): State<Arc<AppState<D>>>,
    Path(name): Path<String>,
) -> GatewayResult {
    state
        .supervisor
        .kill(&name)
        .await
        .map_err(super::error_response)?;
    ok(serde_json::json!({"killed": name}))
}
