// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use squad_core::TaskPatch;

fn open_store(dir: &tempfile::TempDir) -> TaskStore {
    TaskStore::open(&dir.path().join("tasks.db"), "demo").unwrap()
}

fn spec(title: &str) -> TaskSpec {
    TaskSpec {
        title: title.into(),
        ..Default::default()
    }
}

fn epic_spec(title: &str) -> TaskSpec {
    TaskSpec {
        title: title.into(),
        issue_type: Some(IssueType::Epic),
        ..Default::default()
    }
}

fn child_spec(title: &str, parent: &TaskId) -> TaskSpec {
    TaskSpec {
        title: title.into(),
        parent: Some(parent.clone()),
        ..Default::default()
    }
}

// --- create ---

#[test]
fn create_assigns_project_prefixed_id() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let task = store.create(spec("first"), 1).unwrap();
    assert!(task.id.as_str().starts_with("demo-"), "{}", task.id);
    assert!(TaskId::validate(task.id.as_str()).is_ok());
    assert_eq!(task.status, TaskStatus::Open);
}

#[test]
fn create_fields_survive_show() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let mut s = spec("titled");
    s.description = "desc".into();
    s.priority = Some(Priority::new(1).unwrap());
    s.labels.insert("x".into());
    let created = store.create(s, 1).unwrap();
    let shown = store.show(&created.id).unwrap();
    assert_eq!(shown.title, "titled");
    assert_eq!(shown.description, "desc");
    assert_eq!(shown.priority, Priority::new(1).unwrap());
    assert!(shown.labels.contains("x"));
}

#[test]
fn child_ids_increment_and_wire_parent_dependency() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let epic = store.create(epic_spec("epic"), 1).unwrap();
    let c1 = store.create(child_spec("one", &epic.id), 2).unwrap();
    let c2 = store.create(child_spec("two", &epic.id), 3).unwrap();
    assert_eq!(c1.id.as_str(), format!("{}.1", epic.id));
    assert_eq!(c2.id.as_str(), format!("{}.2", epic.id));

    let epic = store.show(&epic.id).unwrap();
    assert!(epic.depends_on.contains(&c1.id));
    assert!(epic.depends_on.contains(&c2.id));
    assert_eq!(c1.parent.as_ref(), Some(&epic.id));
}

#[test]
fn create_child_of_closed_parent_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let root = store.create(spec("root"), 1).unwrap();
    store.close(&root.id, false, 2).unwrap();
    let err = store.create(child_spec("late", &root.id), 3).unwrap_err();
    assert!(matches!(err, TaskStoreError::ParentClosed(id) if id == root.id));
}

#[test]
fn create_rejects_unknown_dependency() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let mut s = spec("dependent");
    s.depends_on.insert(TaskId::new("demo-zzzz"));
    assert!(matches!(
        store.create(s, 1),
        Err(TaskStoreError::UnknownDependency(_))
    ));
}

#[test]
fn bulk_create_resolves_parent_index() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let mut child = spec("child");
    child.parent_index = Some(0);
    let created = store.create_bulk(vec![epic_spec("epic"), child], 1).unwrap();
    assert_eq!(created.len(), 2);
    assert_eq!(created[1].parent.as_ref(), Some(&created[0].id));
}

// --- update ---

#[test]
fn update_requires_assignee_for_in_progress() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let task = store.create(spec("t"), 1).unwrap();

    let patch = TaskPatch {
        status: Some(TaskStatus::InProgress),
        ..Default::default()
    };
    assert!(matches!(
        store.update(&task.id, patch, 2),
        Err(TaskStoreError::Task(TaskError::AssigneeRequired))
    ));

    let patch = TaskPatch {
        status: Some(TaskStatus::InProgress),
        assignee: Some(Some("AlphaGlade".into())),
        ..Default::default()
    };
    let updated = store.update(&task.id, patch, 3).unwrap();
    assert_eq!(updated.status, TaskStatus::InProgress);
    assert_eq!(updated.assignee.as_deref(), Some("AlphaGlade"));
}

#[test]
fn failed_update_leaves_store_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let task = store.create(spec("t"), 1).unwrap();
    let patch = TaskPatch {
        title: Some("changed".into()),
        status: Some(TaskStatus::InProgress), // fails: no assignee
        ..Default::default()
    };
    assert!(store.update(&task.id, patch, 2).is_err());
    assert_eq!(store.show(&task.id).unwrap().title, "t");
}

#[test]
fn update_status_closed_respects_dependencies() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let dep = store.create(spec("dep"), 1).unwrap();
    let mut s = spec("main");
    s.depends_on.insert(dep.id.clone());
    let main = store.create(s, 2).unwrap();

    let patch = TaskPatch {
        status: Some(TaskStatus::Closed),
        ..Default::default()
    };
    assert!(matches!(
        store.update(&main.id, patch, 3),
        Err(TaskStoreError::OpenDependencies { .. })
    ));
}

// --- close / reopen ---

#[test]
fn close_with_override_skips_dependency_check() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let dep = store.create(spec("dep"), 1).unwrap();
    let mut s = spec("main");
    s.depends_on.insert(dep.id.clone());
    let main = store.create(s, 2).unwrap();

    assert!(store.close(&main.id, false, 3).is_err());
    let closed = store.close(&main.id, true, 4).unwrap();
    assert_eq!(closed.status, TaskStatus::Closed);
}

#[test]
fn reopen_only_applies_to_closed_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let task = store.create(spec("t"), 1).unwrap();
    assert!(matches!(
        store.reopen(&task.id, 2),
        Err(TaskStoreError::NotClosed(_))
    ));
    store.close(&task.id, false, 3).unwrap();
    let reopened = store.reopen(&task.id, 4).unwrap();
    assert_eq!(reopened.status, TaskStatus::Open);
}

// --- dependencies ---

#[test]
fn dep_cycle_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let a = store.create(spec("a"), 1).unwrap();
    let b = store.create(spec("b"), 2).unwrap();
    store.add_dep(&a.id, &b.id, 3).unwrap();
    assert!(matches!(
        store.add_dep(&b.id, &a.id, 4),
        Err(TaskStoreError::DependencyCycle { .. })
    ));
}

#[test]
fn transitive_dep_cycle_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let a = store.create(spec("a"), 1).unwrap();
    let b = store.create(spec("b"), 2).unwrap();
    let c = store.create(spec("c"), 3).unwrap();
    store.add_dep(&a.id, &b.id, 4).unwrap();
    store.add_dep(&b.id, &c.id, 5).unwrap();
    assert!(matches!(
        store.add_dep(&c.id, &a.id, 6),
        Err(TaskStoreError::DependencyCycle { .. })
    ));
}

#[test]
fn duplicate_and_missing_dep_edits_are_noops() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let a = store.create(spec("a"), 1).unwrap();
    let b = store.create(spec("b"), 2).unwrap();
    store.add_dep(&a.id, &b.id, 3).unwrap();
    store.add_dep(&a.id, &b.id, 4).unwrap();
    assert_eq!(store.show(&a.id).unwrap().depends_on.len(), 1);

    store.remove_dep(&a.id, &b.id, 5).unwrap();
    store.remove_dep(&a.id, &b.id, 6).unwrap();
    assert!(store.show(&a.id).unwrap().depends_on.is_empty());
}

// --- ready / blocked ---

#[test]
fn ready_orders_by_priority_then_age() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let mut low = spec("low");
    low.priority = Some(Priority::new(3).unwrap());
    let mut urgent = spec("urgent");
    urgent.priority = Some(Priority::new(0).unwrap());
    let older = store.create(spec("older"), 1).unwrap();
    let low = store.create(low, 2).unwrap();
    let urgent = store.create(urgent, 3).unwrap();

    let ready: Vec<TaskId> = store.ready().into_iter().map(|t| t.id).collect();
    assert_eq!(ready, vec![urgent.id, older.id, low.id]);
}

#[test]
fn ready_excludes_tasks_with_open_deps() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let dep = store.create(spec("dep"), 1).unwrap();
    let mut s = spec("gated");
    s.depends_on.insert(dep.id.clone());
    let gated = store.create(s, 2).unwrap();

    let ready: Vec<TaskId> = store.ready().into_iter().map(|t| t.id).collect();
    assert!(!ready.contains(&gated.id));

    store.close(&dep.id, false, 3).unwrap();
    let ready: Vec<TaskId> = store.ready().into_iter().map(|t| t.id).collect();
    assert!(ready.contains(&gated.id));
}

#[test]
fn blocked_lists_gated_and_explicitly_blocked() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let dep = store.create(spec("dep"), 1).unwrap();
    let mut s = spec("gated");
    s.depends_on.insert(dep.id.clone());
    let gated = store.create(s, 2).unwrap();
    let stuck = store.create(spec("stuck"), 3).unwrap();
    store
        .update(
            &stuck.id,
            TaskPatch {
                status: Some(TaskStatus::Blocked),
                ..Default::default()
            },
            4,
        )
        .unwrap();

    let blocked: Vec<TaskId> = store.blocked().into_iter().map(|t| t.id).collect();
    assert!(blocked.contains(&gated.id));
    assert!(blocked.contains(&stuck.id));
    assert!(!blocked.contains(&dep.id));
}

// --- epics (scenario: linear epic) ---

#[test]
fn linear_epic_rollup() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let epic = store.create(epic_spec("epic"), 1).unwrap();
    let c1 = store.create(child_spec("one", &epic.id), 2).unwrap();
    let c2 = store.create(child_spec("two", &epic.id), 3).unwrap();

    let ready: Vec<TaskId> = store.ready().into_iter().map(|t| t.id).collect();
    assert_eq!(ready, vec![c1.id.clone(), c2.id.clone()]);

    store.close(&c1.id, false, 4).unwrap();
    let ready: Vec<TaskId> = store.ready().into_iter().map(|t| t.id).collect();
    assert_eq!(ready, vec![c2.id.clone()]);
    assert_eq!(store.close_eligible_epics(5).unwrap(), Vec::<TaskId>::new());
    assert_eq!(
        store.epic_progress(&epic.id).unwrap(),
        EpicProgress { done: 1, total: 2 }
    );

    store.close(&c2.id, false, 6).unwrap();
    assert_eq!(
        store.epic_progress(&epic.id).unwrap(),
        EpicProgress { done: 2, total: 2 }
    );
    assert_eq!(store.close_eligible_epics(7).unwrap(), vec![epic.id.clone()]);
    assert_eq!(store.show(&epic.id).unwrap().status, TaskStatus::Closed);
}

#[test]
fn childless_epic_is_not_close_eligible() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    store.create(epic_spec("empty epic"), 1).unwrap();
    assert!(store.close_eligible_epics(2).unwrap().is_empty());
}

// --- durability ---

#[test]
fn mutations_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.db");
    let id = {
        let mut store = TaskStore::open(&path, "demo").unwrap();
        let task = store.create(spec("persisted"), 1).unwrap();
        store.close(&task.id, false, 2).unwrap();
        task.id
    };
    let store = TaskStore::open(&path, "demo").unwrap();
    let task = store.show(&id).unwrap();
    assert_eq!(task.status, TaskStatus::Closed);
    assert_eq!(task.title, "persisted");
}

#[test]
fn corrupt_db_refuses_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.db");
    std::fs::write(&path, "garbage").unwrap();
    assert!(matches!(
        TaskStore::open(&path, "demo"),
        Err(TaskStoreError::Store(StoreError::Integrity { .. }))
    ));
}
