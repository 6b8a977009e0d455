// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Squad orchestration engine: signal bus, session supervisor, scheduler,
//! review rules, and the external channel bridge.

mod bridge;
mod bus;
mod error;
mod rules;
mod scheduler;
mod stores;
mod supervisor;

pub use bridge::ChannelBridge;
pub use bus::{BusConfig, BusSubscriber, SignalBus, SubscriberLag};
pub use error::EngineError;
pub use rules::{ReviewAction, ReviewRules, RulesError};
pub use scheduler::{next_task, SchedulerView};
pub use stores::Stores;
pub use supervisor::{SpawnMode, SpawnRequest, Supervisor};
