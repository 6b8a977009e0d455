// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn create_then_exists_then_kill() {
    let adapter = FakeTerminalAdapter::new();
    let outcome = adapter
        .create("squad-AlphaGlade", Path::new("/p"), "claude")
        .await
        .unwrap();
    assert_eq!(outcome, CreateOutcome::Created);
    assert!(adapter.exists("squad-AlphaGlade").await.unwrap());

    adapter.kill("squad-AlphaGlade").await.unwrap();
    assert!(!adapter.exists("squad-AlphaGlade").await.unwrap());
}

#[tokio::test]
async fn create_reports_already_exists() {
    let adapter = FakeTerminalAdapter::new();
    adapter.create("s", Path::new("/p"), "cmd").await.unwrap();
    let second = adapter.create("s", Path::new("/p"), "cmd").await.unwrap();
    assert_eq!(second, CreateOutcome::AlreadyExists);
}

#[tokio::test]
async fn input_is_recorded_in_order() {
    let adapter = FakeTerminalAdapter::new();
    adapter.create("s", Path::new("/p"), "cmd").await.unwrap();
    adapter.send_text("s", "hello").await.unwrap();
    adapter.send_key("s", Key::Enter).await.unwrap();
    assert_eq!(adapter.input_for("s"), vec!["hello", "<Enter>"]);
}

#[tokio::test]
async fn capture_tail_returns_last_lines() {
    let adapter = FakeTerminalAdapter::new();
    adapter.create("s", Path::new("/p"), "cmd").await.unwrap();
    adapter.set_tail("s", vec!["one".into(), "two".into(), "three".into()]);
    assert_eq!(adapter.capture_tail("s", 2).await.unwrap(), "two\nthree");
}

#[tokio::test]
async fn backend_absent_fails_everything() {
    let adapter = FakeTerminalAdapter::new();
    adapter.set_backend_absent(true);
    assert!(matches!(
        adapter.create("s", Path::new("/p"), "cmd").await,
        Err(TerminalError::NoBackend(_))
    ));
    assert!(matches!(
        adapter.list().await,
        Err(TerminalError::NoBackend(_))
    ));
}

#[tokio::test]
async fn vanish_simulates_crash() {
    let adapter = FakeTerminalAdapter::new();
    adapter.create("s", Path::new("/p"), "cmd").await.unwrap();
    adapter.vanish("s");
    assert!(!adapter.exists("s").await.unwrap());
    assert!(matches!(
        adapter.send_text("s", "x").await,
        Err(TerminalError::NotFound(_))
    ));
}

#[tokio::test]
async fn rename_preserves_state() {
    let adapter = FakeTerminalAdapter::new();
    adapter.create("old", Path::new("/p"), "cmd").await.unwrap();
    adapter.send_text("old", "before").await.unwrap();
    adapter.rename("old", "new").await.unwrap();
    assert!(!adapter.exists("old").await.unwrap());
    assert_eq!(adapter.input_for("new"), vec!["before"]);
}

#[tokio::test]
async fn calls_are_recorded() {
    let adapter = FakeTerminalAdapter::new();
    adapter.create("s", Path::new("/p"), "cmd").await.unwrap();
    adapter.list().await.unwrap();
    let calls = adapter.calls();
    assert!(matches!(calls[0], TerminalCall::Create { .. }));
    assert!(matches!(calls[1], TerminalCall::List));
}
