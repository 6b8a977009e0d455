// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP/stream gateway.
//!
//! REST surface for task and session CRUD plus a WebSocket stream fanning
//! out bus signals. Error kinds map onto HTTP codes; handlers stay thin
//! and delegate to the engine.

mod admin;
mod sessions;
mod signals;
mod tasks;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;
use squad_adapters::{
    DesktopNotifyAdapter, NotifyAdapter, RandomNameGen, TerminalAdapter, TmuxAdapter,
    TracedTerminal,
};
use squad_core::{Clock, NameGen, SystemClock};
use squad_engine::{EngineError, SignalBus, Stores, Supervisor};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Adapter bundle the gateway is generic over.
pub trait Deps: Send + Sync + 'static {
    type Terminal: TerminalAdapter;
    type Notify: NotifyAdapter;
    type Clock: Clock;
    type Names: NameGen;
}

/// Production bundle: traced tmux, desktop notifications, system clock.
pub struct ProdDeps;

impl Deps for ProdDeps {
    type Terminal = TracedTerminal<TmuxAdapter>;
    type Notify = DesktopNotifyAdapter;
    type Clock = SystemClock;
    type Names = RandomNameGen;
}

/// Shared gateway state.
pub struct AppState<D: Deps> {
    pub supervisor: Arc<Supervisor<D::Terminal, D::Notify, D::Clock, D::Names>>,
    pub stores: Arc<Stores>,
    pub bus: Arc<SignalBus<D::Clock>>,
    pub clock: D::Clock,
    pub started_at_ms: u64,
}

/// Build the gateway router.
pub fn router<D: Deps>(state: Arc<AppState<D>>) -> Router {
    Router::new()
        .route("/tasks", post(tasks::create).get(tasks::list))
        .route("/tasks/bulk", post(tasks::create_bulk))
        .route("/tasks/ready", get(tasks::ready))
        .route("/tasks/blocked", get(tasks::blocked))
        .route(
            "/tasks/{id}",
            get(tasks::show).patch(tasks::update).delete(tasks::close),
        )
        .route("/tasks/{id}/reopen", post(tasks::reopen))
        .route("/tasks/{id}/deps", post(tasks::add_dep))
        .route("/tasks/{id}/deps/{dep}", delete(tasks::remove_dep))
        .route("/epic/close-eligible", get(tasks::close_eligible_epics))
        .route("/epic/{id}/progress", get(tasks::epic_progress))
        .route("/work/spawn", post(sessions::spawn))
        .route("/sessions", get(sessions::list))
        .route(
            "/sessions/{name}",
            get(sessions::show).delete(sessions::kill),
        )
        .route("/sessions/{name}/pause", post(sessions::pause))
        .route("/sessions/{name}/resume", post(sessions::resume))
        .route("/sessions/{name}/attach", post(sessions::attach))
        .route("/signals/{kind}", post(signals::receive))
        .route("/signals/stream", get(signals::stream))
        .route("/signals/latest", get(signals::latest))
        .route("/reservations", post(admin::acquire).get(admin::list_reservations))
        .route("/reservations/release", post(admin::release))
        .route("/agents", get(admin::list_agents))
        .route("/agents/recent", get(admin::recent_agents))
        .route("/agents/purge", post(admin::purge_agents))
        .route("/status", get(admin::status))
        .route("/backup", post(admin::backup))
        .route("/restore", post(admin::restore))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Wire shape of an error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// Translate an engine error kind to an HTTP response.
pub fn error_response(e: EngineError) -> Response {
    let (status, kind) = match &e {
        EngineError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
        EngineError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        EngineError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
        EngineError::TaskClosed(_) => (StatusCode::CONFLICT, "task_closed"),
        EngineError::InvariantViolation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invariant"),
        EngineError::BackendUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "backend_unavailable"),
        EngineError::Integrity(_) => (StatusCode::INTERNAL_SERVER_ERROR, "integrity"),
        EngineError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    };
    (
        status,
        Json(ErrorBody {
            error: kind,
            message: e.to_string(),
        }),
    )
        .into_response()
}

/// Shorthand for handler results.
pub(crate) type GatewayResult = Result<Response, Response>;

pub(crate) fn ok<T: Serialize>(value: T) -> GatewayResult {
    Ok(Json(value).into_response())
}

pub(crate) fn created<T: Serialize>(value: T) -> GatewayResult {
    Ok((StatusCode::CREATED, Json(value)).into_response())
}

pub(crate) fn engine_err(e: impl Into<EngineError>) -> Response {
    error_response(e.into())
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;
