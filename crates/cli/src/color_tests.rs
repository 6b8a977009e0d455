// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    working = { "working", "\x1b[32m" },
    in_progress = { "in_progress", "\x1b[32m" },
    closed = { "closed", "\x1b[32m" },
    pending = { "pending", "\x1b[33m" },
    paused = { "paused", "\x1b[33m" },
    open = { "open", "\x1b[33m" },
    dead = { "dead", "\x1b[31m" },
)]
fn status_picks_semantic_color(status: &str, prefix: &str) {
    let colored = apply_status(status);
    assert!(colored.starts_with(prefix), "{status}: {colored:?}");
    assert!(colored.ends_with("\x1b[0m"));
}

#[test]
fn unknown_status_is_left_alone() {
    assert_eq!(apply_status("mystery"), "mystery");
}

#[test]
fn compound_status_matches_first_word() {
    let colored = apply_status("dead (stale)");
    assert!(colored.starts_with("\x1b[31m"));
}

#[test]
fn header_and_muted_wrap_with_reset() {
    assert!(apply_header("X").contains('X'));
    assert!(apply_muted("X").ends_with("\x1b[0m"));
}
