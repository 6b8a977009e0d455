// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signal bus: ingestion, dedup, fan-out, and bounded replay.
//!
//! Signals enter from the HTTP endpoint and from the supervisor itself.
//! Subscribers get every published signal in receive order; a subscriber
//! that falls more than the backlog behind observes a lag marker instead
//! of the lost signals. A bounded in-memory ring keeps recent history so
//! reconnecting subscribers can replay from a sequence number. Durable
//! latest-per-(session, kind) records are owned by the supervisor, not
//! the bus.

use parking_lot::Mutex;
use squad_core::{Clock, SessionName, Signal, SignalEnvelope, SignalKind, SignalPayload};
use std::collections::HashMap;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::EngineError;

/// Bus tuning knobs.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Per-subscriber backlog before lag markers appear
    pub subscriber_backlog: usize,
    /// Replay ring size bound
    pub history_limit: usize,
    /// Replay ring age bound
    pub history_window: Duration,
    /// Window within which identical consecutive signals collapse
    pub dedup_window: Duration,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            subscriber_backlog: 1024,
            history_limit: 10_000,
            history_window: Duration::from_secs(600),
            dedup_window: Duration::from_millis(200),
        }
    }
}

/// Marker a lagging subscriber observes in place of lost signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberLag {
    pub skipped: u64,
}

struct BusInner {
    next_seq: u64,
    history: VecDeque<Signal>,
    /// Last accepted (hash, received_at_ms) per (session, kind) for dedup
    last_accepted: HashMap<(String, SignalKind), (u64, u64)>,
    dropped_malformed: u64,
}

/// Fan-out bus over typed lifecycle signals.
pub struct SignalBus<C: Clock> {
    clock: C,
    config: BusConfig,
    inner: Mutex<BusInner>,
    tx: broadcast::Sender<Signal>,
}

impl<C: Clock> SignalBus<C> {
    pub fn new(clock: C, config: BusConfig) -> Self {
        let (tx, _) = broadcast::channel(config.subscriber_backlog);
        Self {
            clock,
            config,
            inner: Mutex::new(BusInner {
                next_seq: 0,
                history: VecDeque::new(),
                last_accepted: HashMap::new(),
                dropped_malformed: 0,
            }),
            tx,
        }
    }

    /// Decode and publish one signal envelope for a session.
    ///
    /// Returns the accepted signal, or `None` when the dedup window
    /// collapsed it. Malformed payloads for known kinds are counted and
    /// rejected; they never rewind state anywhere.
    pub fn publish(
        &self,
        session: &SessionName,
        envelope: SignalEnvelope,
    ) -> Result<Option<Signal>, EngineError> {
        let payload = match SignalPayload::decode(&envelope.kind, envelope.payload) {
            Ok(payload) => payload,
            Err(e) => {
                let mut inner = self.inner.lock();
                inner.dropped_malformed += 1;
                tracing::warn!(
                    session = session.as_str(),
                    kind = %envelope.kind,
                    error = %e,
                    dropped = inner.dropped_malformed,
                    "malformed signal payload dropped"
                );
                return Err(EngineError::Validation(format!(
                    "malformed {} payload: {e}",
                    envelope.kind
                )));
            }
        };

        let now_ms = self.clock.epoch_ms();
        let hash = payload.content_hash();
        let key = (session.as_str().to_string(), envelope.kind.clone());

        let signal = {
            let mut inner = self.inner.lock();

            if let Some((last_hash, last_ms)) = inner.last_accepted.get(&key) {
                let window_ms = self.config.dedup_window.as_millis() as u64;
                if *last_hash == hash && now_ms.saturating_sub(*last_ms) <= window_ms {
                    tracing::debug!(
                        session = session.as_str(),
                        kind = %envelope.kind,
                        "duplicate signal collapsed"
                    );
                    return Ok(None);
                }
            }

            inner.next_seq += 1;
            let signal = Signal {
                session: session.clone(),
                kind: envelope.kind.clone(),
                task: payload.task().cloned(),
                payload,
                seq: inner.next_seq,
                received_at_ms: now_ms,
            };

            inner.last_accepted.insert(key, (hash, now_ms));
            inner.history.push_back(signal.clone());
            self.evict(&mut inner, now_ms);
            signal
        };

        // No subscribers is fine; history still retains the signal
        let _ = self.tx.send(signal.clone());
        Ok(Some(signal))
    }

    fn evict(&self, inner: &mut BusInner, now_ms: u64) {
        while inner.history.len() > self.config.history_limit {
            inner.history.pop_front();
        }
        let window_ms = self.config.history_window.as_millis() as u64;
        while inner
            .history
            .front()
            .is_some_and(|s| now_ms.saturating_sub(s.received_at_ms) > window_ms)
        {
            inner.history.pop_front();
        }
    }

    /// Subscribe to the live fan-out.
    pub fn subscribe(&self) -> BusSubscriber {
        BusSubscriber {
            rx: self.tx.subscribe(),
        }
    }

    /// Signals still retained with `seq` greater than `after`.
    pub fn replay_since(&self, after: u64) -> Vec<Signal> {
        let inner = self.inner.lock();
        inner
            .history
            .iter()
            .filter(|s| s.seq > after)
            .cloned()
            .collect()
    }

    /// Highest sequence number assigned so far.
    pub fn last_seq(&self) -> u64 {
        self.inner.lock().next_seq
    }

    /// Count of malformed payloads rejected since startup.
    pub fn dropped_malformed(&self) -> u64 {
        self.inner.lock().dropped_malformed
    }
}

/// One subscriber's view of the stream.
pub struct BusSubscriber {
    rx: broadcast::Receiver<Signal>,
}

impl BusSubscriber {
    /// Next signal, or a lag marker when the backlog overflowed. `None`
    /// when the bus is gone.
    pub async fn recv(&mut self) -> Option<Result<Signal, SubscriberLag>> {
        match self.rx.recv().await {
            Ok(signal) => Some(Ok(signal)),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                Some(Err(SubscriberLag { skipped }))
            }
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
