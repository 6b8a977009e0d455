// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn config_paths_live_under_state_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(dir.path()).unwrap();
    assert_eq!(config.state_dir, dir.path().join(".squad"));
    assert_eq!(config.lock_path, dir.path().join(".squad/daemon.pid"));
    assert!(!config.project.is_empty());
}

#[test]
fn lock_is_exclusive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("daemon.pid");

    let held = acquire_lock(&path).unwrap();
    assert!(lock_is_held(&path));
    assert!(matches!(
        acquire_lock(&path),
        Err(LifecycleError::AlreadyRunning(_))
    ));

    drop(held);
    assert!(!lock_is_held(&path));
    assert!(acquire_lock(&path).is_ok());
}

#[test]
fn lock_file_records_pid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("daemon.pid");
    let _held = acquire_lock(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.trim(), std::process::id().to_string());
}

#[test]
fn missing_lock_file_is_not_held() {
    let dir = tempfile::tempdir().unwrap();
    assert!(!lock_is_held(&dir.path().join("daemon.pid")));
}
