//! CLI help output specs
//!
//! Verify help text displays and bad input fails cleanly.

use crate::prelude::*;

#[test]
fn help_lists_the_verbs() {
    let project = Project::new();
    let output = project.squad().arg("--help").output().unwrap();
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    for verb in [
        "create", "list", "show", "update", "close", "ready", "dep", "epic", "backup", "rollback",
        "work", "session", "daemon",
    ] {
        assert!(text.contains(verb), "help missing `{verb}`:\n{text}");
    }
}

#[test]
fn version_prints() {
    let project = Project::new();
    project.squad().arg("--version").assert().success();
}

#[test]
fn invalid_task_id_is_a_user_error() {
    let project = Project::new();
    let (code, stderr) = project.run_err(&["show", "NOT-AN-ID"]);
    assert_eq!(code, 1, "{stderr}");
    assert!(stderr.contains("invalid task id"), "{stderr}");
}

#[test]
fn missing_task_is_a_user_error() {
    let project = Project::new();
    let (code, _) = project.run_err(&["show", "demo-zzzz"]);
    assert_eq!(code, 1);
}
