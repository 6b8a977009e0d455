// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signal ingestion and the streaming fan-out.

use super::{engine_err, ok, AppState, Deps, GatewayResult};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use squad_core::{SessionName, Signal, SignalEnvelope, SignalKind};
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SignalBody {
    pub session: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub timestamp: Option<u64>,
}

/// `POST /signals/{kind}` — receive one signal from an agent.
///
/// Malformed payloads are dropped (counted, logged) and reported to the
/// sender; they never affect session state.
pub async fn receive<D: Deps>(
    State(state): State<Arc<AppState<D>>>,
    Path(kind): Path<String>,
    Json(body): Json<SignalBody>,
) -> GatewayResult {
    #[allow(clippy::unwrap_used)] // SignalKind::from_str is infallible
    let kind = SignalKind::from_str(&kind).unwrap();
    let session = SessionName::new(body.session);
    let envelope = SignalEnvelope {
        kind,
        payload: body.payload,
        timestamp: body.timestamp,
    };

    let accepted = state
        .bus
        .publish(&session, envelope)
        .map_err(engine_err)?;
    match accepted {
        Some(signal) => {
            state
                .supervisor
                .apply_signal(&signal)
                .await
                .map_err(super::error_response)?;
            ok(json!({"accepted": true, "seq": signal.seq}))
        }
        None => ok(json!({"accepted": false, "deduplicated": true})),
    }
}

/// `GET /signals/latest?session=` — durable latest per (session, kind).
#[derive(Debug, Deserialize)]
pub struct LatestQuery {
    pub session: String,
}

pub async fn latest<D: Deps>(
    State(state): State<Arc<AppState<D>>>,
    Query(query): Query<LatestQuery>,
) -> GatewayResult {
    ok(state.stores.signals.lock().for_session(&query.session))
}

#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    /// Replay retained signals with seq greater than this before going live
    #[serde(default)]
    pub after: Option<u64>,
}

/// `GET /signals/stream` — WebSocket fan-out with replay.
pub async fn stream<D: Deps>(
    State(state): State<Arc<AppState<D>>>,
    Query(query): Query<StreamQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run_stream(socket, state, query.after))
}

fn frame(signal: &Signal) -> String {
    json!({
        "seq": signal.seq,
        "session": signal.session,
        "kind": signal.kind,
        "task": signal.task,
        "payload": signal.payload,
        "timestamp": signal.received_at_ms,
    })
    .to_string()
}

async fn run_stream<D: Deps>(mut socket: WebSocket, state: Arc<AppState<D>>, after: Option<u64>) {
    // Subscribe before replaying so nothing falls between the two
    let mut subscriber = state.bus.subscribe();

    // Opening snapshot: current session records
    let snapshot = json!({"snapshot": state.supervisor.sessions()}).to_string();
    if socket.send(Message::Text(snapshot.into())).await.is_err() {
        return;
    }

    let mut replayed_to = after.unwrap_or(0);
    if after.is_some() {
        for signal in state.bus.replay_since(replayed_to) {
            replayed_to = signal.seq;
            if socket
                .send(Message::Text(frame(&signal).into()))
                .await
                .is_err()
            {
                return;
            }
        }
    }

    loop {
        tokio::select! {
            received = subscriber.recv() => {
                match received {
                    Some(Ok(signal)) => {
                        // Replay may already have covered this one
                        if signal.seq <= replayed_to {
                            continue;
                        }
                        if socket.send(Message::Text(frame(&signal).into())).await.is_err() {
                            break;
                        }
                    }
                    Some(Err(lag)) => {
                        let marker = json!({"lagged": lag.skipped}).to_string();
                        if socket.send(Message::Text(marker.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }
}
