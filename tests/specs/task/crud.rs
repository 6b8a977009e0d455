//! Task CRUD specs: create, show, update, close, reopen, list.

use crate::prelude::*;

#[test]
fn create_show_roundtrip_preserves_fields() {
    let project = Project::new();
    let id = project.create_task(
        "fix the login page",
        &["--type", "bug", "--priority", "1", "--label", "web"],
    );

    let task = project.run_json(&["show", &id]);
    assert_eq!(task["title"], "fix the login page");
    assert_eq!(task["issue_type"], "bug");
    assert_eq!(task["priority"], 1);
    assert_eq!(task["status"], "open");
    assert_eq!(task["labels"][0], "web");
}

#[test]
fn created_ids_carry_the_project_prefix() {
    let project = Project::new();
    let id = project.create_task("first", &[]);
    // Project name derives from the directory; the id shape is
    // <project>-<slug> with a lowercase base36 slug.
    let (prefix, slug) = id.rsplit_once('-').unwrap();
    assert!(!prefix.is_empty());
    assert!(slug.len() >= 3 && slug.len() <= 6, "{id}");
}

#[test]
fn update_moves_status_with_assignee() {
    let project = Project::new();
    let id = project.create_task("work", &[]);

    // in_progress without an assignee violates the invariant: exit 2
    let (code, stderr) = project.run_err(&["update", &id, "--status", "in_progress"]);
    assert_eq!(code, 2, "{stderr}");

    let task = project.run_json(&[
        "update",
        &id,
        "--status",
        "in_progress",
        "--assignee",
        "AlphaGlade",
    ]);
    assert_eq!(task["status"], "in_progress");
    assert_eq!(task["assignee"], "AlphaGlade");
}

#[test]
fn close_and_reopen() {
    let project = Project::new();
    let id = project.create_task("done soon", &[]);
    let closed = project.run_json(&["close", &id]);
    assert_eq!(closed["status"], "closed");

    // Closed is terminal for normal updates: exit 2
    let (code, _) = project.run_err(&["update", &id, "--status", "open"]);
    assert_eq!(code, 2);

    let reopened = project.run_json(&["reopen", &id]);
    assert_eq!(reopened["status"], "open");
}

#[test]
fn list_filters_by_status() {
    let project = Project::new();
    let open = project.create_task("open task", &[]);
    let closed = project.create_task("closed task", &[]);
    project.run_json(&["close", &closed]);

    let listed = project.run_json(&["list", "--status", "open"]);
    let ids: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&open.as_str()));
    assert!(!ids.contains(&closed.as_str()));
}

#[test]
fn ready_orders_by_priority() {
    let project = Project::new();
    let low = project.create_task("low", &["--priority", "4"]);
    let urgent = project.create_task("urgent", &["--priority", "0"]);

    let ready = project.run_json(&["ready"]);
    let ids: Vec<&str> = ready
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![urgent.as_str(), low.as_str()]);
}

#[test]
fn state_survives_separate_invocations() {
    let project = Project::new();
    let id = project.create_task("durable", &[]);
    // Every invocation is a fresh process over the same store
    let task = project.run_json(&["show", &id]);
    assert_eq!(task["title"], "durable");
}
