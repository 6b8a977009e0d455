// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Squad daemon library: HTTP/stream gateway and daemon lifecycle.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod gateway;
pub mod lifecycle;

pub use gateway::{router, AppState, Deps, ProdDeps};
pub use lifecycle::{Config, Daemon, LifecycleError};
