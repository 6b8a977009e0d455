// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn task(status: TaskStatus) -> Task {
    Task {
        id: TaskId::new("demo-abc"),
        title: "demo".into(),
        description: String::new(),
        notes: String::new(),
        issue_type: IssueType::Task,
        priority: Priority::DEFAULT,
        status,
        assignee: None,
        parent: None,
        depends_on: Default::default(),
        labels: Default::default(),
        child_count: 0,
        created_at_ms: 0,
        updated_at_ms: 0,
    }
}

// --- id syntax ---

#[parameterized(
    root = { "demo-abc" },
    root_long_slug = { "demo-a1b2c3" },
    underscore_project = { "my_proj-xy9" },
    child = { "demo-abc.1" },
    grandchild = { "demo-abc.1.12" },
)]
fn valid_ids(id: &str) {
    assert!(TaskId::validate(id).is_ok(), "{id} should be valid");
}

#[parameterized(
    empty = { "" },
    no_slug = { "demo" },
    slug_too_short = { "demo-ab" },
    slug_too_long = { "demo-abcdefg" },
    uppercase = { "Demo-abc" },
    leading_digit = { "1demo-abc" },
    bad_child = { "demo-abc.x" },
    trailing_dot = { "demo-abc." },
)]
fn invalid_ids(id: &str) {
    assert!(TaskId::validate(id).is_err(), "{id} should be rejected");
}

#[test]
fn child_id_appends_ordinal() {
    let parent = TaskId::new("demo-abc");
    assert_eq!(parent.child(1).as_str(), "demo-abc.1");
    assert_eq!(parent.child(1).child(3).as_str(), "demo-abc.1.3");
}

// --- priority ---

#[test]
fn priority_range_enforced() {
    assert!(Priority::new(0).is_ok());
    assert!(Priority::new(4).is_ok());
    assert_eq!(Priority::new(5), Err(TaskError::InvalidPriority(5)));
}

// --- status transitions ---

#[parameterized(
    open_to_in_progress = { TaskStatus::Open, TaskStatus::InProgress },
    open_to_blocked = { TaskStatus::Open, TaskStatus::Blocked },
    open_to_closed = { TaskStatus::Open, TaskStatus::Closed },
    in_progress_to_open = { TaskStatus::InProgress, TaskStatus::Open },
    in_progress_to_blocked = { TaskStatus::InProgress, TaskStatus::Blocked },
    in_progress_to_closed = { TaskStatus::InProgress, TaskStatus::Closed },
    blocked_to_open = { TaskStatus::Blocked, TaskStatus::Open },
    blocked_to_in_progress = { TaskStatus::Blocked, TaskStatus::InProgress },
)]
fn allowed_transitions(from: TaskStatus, to: TaskStatus) {
    assert!(from.can_transition(to));
}

#[parameterized(
    blocked_to_closed = { TaskStatus::Blocked, TaskStatus::Closed },
    closed_to_open = { TaskStatus::Closed, TaskStatus::Open },
    closed_to_in_progress = { TaskStatus::Closed, TaskStatus::InProgress },
    closed_to_blocked = { TaskStatus::Closed, TaskStatus::Blocked },
)]
fn forbidden_transitions(from: TaskStatus, to: TaskStatus) {
    assert!(!from.can_transition(to));
}

#[test]
fn transition_rejects_in_progress_without_assignee() {
    let mut t = task(TaskStatus::Open);
    assert_eq!(
        t.transition(TaskStatus::InProgress),
        Err(TaskError::AssigneeRequired)
    );

    t.assignee = Some("AlphaGlade".into());
    assert!(t.transition(TaskStatus::InProgress).is_ok());
    assert_eq!(t.status, TaskStatus::InProgress);
}

#[test]
fn transition_rejects_closed_reopen() {
    let mut t = task(TaskStatus::Closed);
    assert_eq!(
        t.transition(TaskStatus::Open),
        Err(TaskError::InvalidTransition {
            from: TaskStatus::Closed,
            to: TaskStatus::Open,
        })
    );
}

// --- serde ---

#[test]
fn task_serde_roundtrip() {
    let mut t = task(TaskStatus::Open);
    t.depends_on.insert(TaskId::new("demo-abc.1"));
    t.labels.insert("origin:general".into());
    let json = serde_json::to_string(&t).unwrap();
    let back: Task = serde_json::from_str(&json).unwrap();
    assert_eq!(back, t);
}

#[test]
fn status_serializes_snake_case() {
    let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
    assert_eq!(json, "\"in_progress\"");
}

#[test]
fn patch_empty_detection() {
    assert!(TaskPatch::default().is_empty());
    let patch = TaskPatch {
        title: Some("new".into()),
        ..Default::default()
    };
    assert!(!patch.is_empty());
}

#[test]
fn patch_clear_assignee_roundtrip() {
    let patch = TaskPatch {
        assignee: Some(None),
        ..Default::default()
    };
    let json = serde_json::to_string(&patch).unwrap();
    let back: TaskPatch = serde_json::from_str(&json).unwrap();
    assert_eq!(back.assignee, Some(None));
}
