// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task CRUD handlers.

use super::{created, engine_err, ok, AppState, Deps, GatewayResult};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use squad_core::{Clock, TaskId, TaskPatch};
use squad_storage::{TaskFilter, TaskSpec};
use std::sync::Arc;

fn task_id(raw: &str) -> Result<TaskId, axum::response::Response> {
    TaskId::validate(raw).map_err(engine_err)
}

/// `POST /tasks` — single spec or an array of specs.
pub async fn create<D: Deps>(
    State(state): State<Arc<AppState<D>>>,
    Json(body): Json<Value>,
) -> GatewayResult {
    let now_ms = state.clock.epoch_ms();
    if body.is_array() {
        let specs: Vec<TaskSpec> = serde_json::from_value(body)
            .map_err(|e| engine_err(squad_engine::EngineError::Validation(e.to_string())))?;
        let tasks = state
            .stores
            .tasks
            .lock()
            .create_bulk(specs, now_ms)
            .map_err(engine_err)?;
        created(tasks)
    } else {
        let spec: TaskSpec = serde_json::from_value(body)
            .map_err(|e| engine_err(squad_engine::EngineError::Validation(e.to_string())))?;
        let task = state
            .stores
            .tasks
            .lock()
            .create(spec, now_ms)
            .map_err(engine_err)?;
        created(task)
    }
}

/// `POST /tasks/bulk` — bulk create with dep wiring.
pub async fn create_bulk<D: Deps>(
    State(state): State<Arc<AppState<D>>>,
    Json(specs): Json<Vec<TaskSpec>>,
) -> GatewayResult {
    let now_ms = state.clock.epoch_ms();
    let tasks = state
        .stores
        .tasks
        .lock()
        .create_bulk(specs, now_ms)
        .map_err(engine_err)?;
    created(tasks)
}

/// `GET /tasks?{filter}`
pub async fn list<D: Deps>(
    State(state): State<Arc<AppState<D>>>,
    Query(filter): Query<TaskFilter>,
) -> GatewayResult {
    ok(state.stores.tasks.lock().list(&filter))
}

/// `GET /tasks/ready`
pub async fn ready<D: Deps>(State(state): State<Arc<AppState<D>>>) -> GatewayResult {
    ok(state.stores.tasks.lock().ready())
}

/// `GET /tasks/blocked` — explicitly blocked, or open with an unclosed dep.
pub async fn blocked<D: Deps>(State(state): State<Arc<AppState<D>>>) -> GatewayResult {
    ok(state.stores.tasks.lock().blocked())
}

/// `GET /tasks/{id}`
pub async fn show<D: Deps>(
    State(state): State<Arc<AppState<D>>>,
    Path(id): Path<String>,
) -> GatewayResult {
    let id = task_id(&id)?;
    let task = state.stores.tasks.lock().show(&id).map_err(engine_err)?;
    ok(task)
}

/// `PATCH /tasks/{id}`
pub async fn update<D: Deps>(
    State(state): State<Arc<AppState<D>>>,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> GatewayResult {
    let id = task_id(&id)?;
    let now_ms = state.clock.epoch_ms();
    let task = state
        .stores
        .tasks
        .lock()
        .update(&id, patch, now_ms)
        .map_err(engine_err)?;
    ok(task)
}

#[derive(Debug, Default, Deserialize)]
pub struct CloseQuery {
    #[serde(default, rename = "override")]
    pub override_deps: bool,
}

/// `DELETE /tasks/{id}` — close (same as PATCH status=closed).
pub async fn close<D: Deps>(
    State(state): State<Arc<AppState<D>>>,
    Path(id): Path<String>,
    Query(query): Query<CloseQuery>,
) -> GatewayResult {
    let id = task_id(&id)?;
    let now_ms = state.clock.epoch_ms();
    let task = state
        .stores
        .tasks
        .lock()
        .close(&id, query.override_deps, now_ms)
        .map_err(engine_err)?;
    ok(task)
}

/// `POST /tasks/{id}/reopen` — explicit admin verb for closed tasks.
pub async fn reopen<D: Deps>(
    State(state): State<Arc<AppState<D>>>,
    Path(id): Path<String>,
) -> GatewayResult {
    let id = task_id(&id)?;
    let now_ms = state.clock.epoch_ms();
    let task = state
        .stores
        .tasks
        .lock()
        .reopen(&id, now_ms)
        .map_err(engine_err)?;
    ok(task)
}

#[derive(Debug, Deserialize)]
pub struct AddDepBody {
    pub on: TaskId,
}

/// `POST /tasks/{id}/deps` — add a dependency edge.
pub async fn add_dep<D: Deps>(
    State(state): State<Arc<AppState<D>>>,
    Path(id): Path<String>,
    Json(body): Json<AddDepBody>,
) -> GatewayResult {
    let id = task_id(&id)?;
    let now_ms = state.clock.epoch_ms();
    state
        .stores
        .tasks
        .lock()
        .add_dep(&id, &body.on, now_ms)
        .map_err(engine_err)?;
    ok(serde_json::json!({"added": true}))
}

/// `DELETE /tasks/{id}/deps/{dep}` — remove a dependency edge.
pub async fn remove_dep<D: Deps>(
    State(state): State<Arc<AppState<D>>>,
    Path((id, dep)): Path<(String, String)>,
) -> GatewayResult {
    let id = task_id(&id)?;
    let dep = task_id(&dep)?;
    let now_ms = state.clock.epoch_ms();
    state
        .stores
        .tasks
        .lock()
        .remove_dep(&id, &dep, now_ms)
        .map_err(engine_err)?;
    ok(serde_json::json!({"removed": true}))
}

/// `GET /epic/close-eligible` — close epics whose children are all closed.
pub async fn close_eligible_epics<D: Deps>(State(state): State<Arc<AppState<D>>>) -> GatewayResult {
    let now_ms = state.clock.epoch_ms();
    let closed = state
        .stores
        .tasks
        .lock()
        .close_eligible_epics(now_ms)
        .map_err(engine_err)?;
    ok(closed)
}

/// `GET /epic/{id}/progress`
pub async fn epic_progress<D: Deps>(
    State(state): State<Arc<AppState<D>>>,
    Path(id): Path<String>,
) -> GatewayResult {
    let id = task_id(&id)?;
    let progress = state
        .stores
        .tasks
        .lock()
        .epic_progress(&id)
        .map_err(engine_err)?;
    ok(progress)
}
