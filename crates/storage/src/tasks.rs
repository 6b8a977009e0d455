// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable, dependency-aware task repository.
//!
//! Owns tasks exclusively. Mutations are validated against the status
//! table and the dependency invariants, persisted before returning, and
//! served to readers from the in-memory image.

use crate::store::{load_document, write_atomic, StoreError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use squad_core::{
    base36_nonce, IssueType, Priority, Task, TaskError, TaskId, TaskPatch, TaskStatus,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DOCUMENT_VERSION: u32 = 1;
const ROOT_SLUG_LEN: usize = 4;

/// Errors from task store operations
#[derive(Debug, Error)]
pub enum TaskStoreError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error("task not found: {0}")]
    NotFound(TaskId),
    #[error("unknown dependency: {0}")]
    UnknownDependency(TaskId),
    #[error("dependency cycle: {from} -> {to}")]
    DependencyCycle { from: TaskId, to: TaskId },
    #[error("parent {0} is closed")]
    ParentClosed(TaskId),
    #[error("cannot close {id}: open dependencies {open:?}")]
    OpenDependencies { id: TaskId, open: Vec<TaskId> },
    #[error("task {0} is not closed")]
    NotClosed(TaskId),
}

/// Creation request for one task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskSpec {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<TaskId>,
    /// Index of an earlier spec in the same bulk batch to parent under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_index: Option<usize>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub depends_on: BTreeSet<TaskId>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub labels: BTreeSet<String>,
}

/// Filter for [`TaskStore::list`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<TaskId>,
}

impl TaskFilter {
    fn matches(&self, task: &Task) -> bool {
        self.status.is_none_or(|s| task.status == s)
            && self.issue_type.is_none_or(|t| task.issue_type == t)
            && self
                .assignee
                .as_ref()
                .is_none_or(|a| task.assignee.as_deref() == Some(a.as_str()))
            && self.label.as_ref().is_none_or(|l| task.labels.contains(l))
            && self
                .parent
                .as_ref()
                .is_none_or(|p| task.parent.as_ref() == Some(p))
    }
}

/// Epic completion counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpicProgress {
    pub done: usize,
    pub total: usize,
}

/// On-disk document shape.
#[derive(Debug, Serialize, Deserialize)]
struct TaskDocument {
    version: u32,
    project: String,
    tasks: IndexMap<TaskId, Task>,
}

/// Durable task repository for one project.
#[derive(Debug)]
pub struct TaskStore {
    path: PathBuf,
    project: String,
    tasks: IndexMap<TaskId, Task>,
}

impl TaskStore {
    /// Open the store at `path`, creating an empty one if absent.
    pub fn open(path: &Path, project: &str) -> Result<Self, TaskStoreError> {
        let document: Option<TaskDocument> = load_document(path)?;
        let tasks = match document {
            Some(doc) => doc.tasks,
            None => IndexMap::new(),
        };
        Ok(Self {
            path: path.to_owned(),
            project: project.to_string(),
            tasks,
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    fn persist(&self) -> Result<(), TaskStoreError> {
        let document = TaskDocument {
            version: DOCUMENT_VERSION,
            project: self.project.clone(),
            tasks: self.tasks.clone(),
        };
        write_atomic(&self.path, &document)?;
        Ok(())
    }

    fn get(&self, id: &TaskId) -> Result<&Task, TaskStoreError> {
        self.tasks
            .get(id)
            .ok_or_else(|| TaskStoreError::NotFound(id.clone()))
    }

    /// Create one task; persists before returning.
    pub fn create(&mut self, spec: TaskSpec, now_ms: u64) -> Result<Task, TaskStoreError> {
        let task = self.build_task(spec, now_ms)?;
        self.tasks.insert(task.id.clone(), task.clone());
        self.persist()?;
        Ok(task)
    }

    /// Create a batch with one persist at the end. `parent_index` entries
    /// may point at earlier specs in the same batch.
    pub fn create_bulk(
        &mut self,
        specs: Vec<TaskSpec>,
        now_ms: u64,
    ) -> Result<Vec<Task>, TaskStoreError> {
        let mut created: Vec<Task> = Vec::with_capacity(specs.len());
        for mut spec in specs {
            if let Some(index) = spec.parent_index.take() {
                let parent = created
                    .get(index)
                    .map(|t: &Task| t.id.clone())
                    .ok_or_else(|| TaskStoreError::NotFound(TaskId::new(format!("#{index}"))))?;
                spec.parent = Some(parent);
            }
            let task = self.build_task(spec, now_ms)?;
            self.tasks.insert(task.id.clone(), task.clone());
            created.push(task);
        }
        self.persist()?;
        Ok(created)
    }

    fn build_task(&mut self, spec: TaskSpec, now_ms: u64) -> Result<Task, TaskStoreError> {
        for dep in &spec.depends_on {
            if !self.tasks.contains_key(dep) {
                return Err(TaskStoreError::UnknownDependency(dep.clone()));
            }
        }

        let id = match &spec.parent {
            Some(parent_id) => {
                let parent = self.get(parent_id)?;
                if parent.status.is_closed() {
                    return Err(TaskStoreError::ParentClosed(parent_id.clone()));
                }
                let n = parent.child_count + 1;
                let child_id = parent_id.child(n);
                // Wire both directions: parent depends on child, parent
                // child counter advances.
                if let Some(parent) = self.tasks.get_mut(parent_id) {
                    parent.child_count = n;
                    parent.depends_on.insert(child_id.clone());
                    parent.updated_at_ms = now_ms;
                }
                child_id
            }
            None => self.fresh_root_id()?,
        };

        let task = Task {
            id: id.clone(),
            title: spec.title,
            description: spec.description,
            notes: spec.notes,
            issue_type: spec.issue_type.unwrap_or(IssueType::Task),
            priority: spec.priority.unwrap_or_default(),
            status: TaskStatus::Open,
            assignee: None,
            parent: spec.parent,
            depends_on: spec.depends_on,
            labels: spec.labels,
            child_count: 0,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        };
        Ok(task)
    }

    fn fresh_root_id(&self) -> Result<TaskId, TaskStoreError> {
        // Nonce collisions are rare; bail out only if the space looks full.
        for _ in 0..64 {
            let candidate = TaskId::validate(&format!(
                "{}-{}",
                self.project,
                base36_nonce(ROOT_SLUG_LEN)
            ))?;
            if !self.tasks.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
        Err(TaskStoreError::Task(TaskError::InvalidId(format!(
            "{}-<slug>: id space exhausted",
            self.project
        ))))
    }

    /// Atomic field update with invariant checks.
    pub fn update(
        &mut self,
        id: &TaskId,
        patch: TaskPatch,
        now_ms: u64,
    ) -> Result<Task, TaskStoreError> {
        // Work on a copy so a failed validation leaves the store untouched.
        let mut task = self.get(id)?.clone();

        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(notes) = patch.notes {
            task.notes = notes;
        }
        if let Some(issue_type) = patch.issue_type {
            task.issue_type = issue_type;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(assignee) = patch.assignee {
            task.assignee = assignee;
        }
        if let Some(labels) = patch.labels {
            task.labels = labels;
        }
        if let Some(status) = patch.status {
            if status == TaskStatus::Closed {
                self.check_close_allowed(&task, false)?;
            }
            task.transition(status)?;
        }
        task.updated_at_ms = now_ms;

        self.tasks.insert(id.clone(), task.clone());
        self.persist()?;
        Ok(task)
    }

    fn check_close_allowed(&self, task: &Task, override_deps: bool) -> Result<(), TaskStoreError> {
        if override_deps {
            return Ok(());
        }
        let open: Vec<TaskId> = task
            .depends_on
            .iter()
            .filter(|dep| {
                self.tasks
                    .get(*dep)
                    .is_some_and(|t| !t.status.is_closed())
            })
            .cloned()
            .collect();
        if open.is_empty() {
            Ok(())
        } else {
            Err(TaskStoreError::OpenDependencies {
                id: task.id.clone(),
                open,
            })
        }
    }

    /// Close a task. Requires all dependencies closed unless `override_deps`
    /// (epic UAT workflows).
    pub fn close(
        &mut self,
        id: &TaskId,
        override_deps: bool,
        now_ms: u64,
    ) -> Result<Task, TaskStoreError> {
        let mut task = self.get(id)?.clone();
        self.check_close_allowed(&task, override_deps)?;
        task.transition(TaskStatus::Closed)?;
        task.updated_at_ms = now_ms;
        self.tasks.insert(id.clone(), task.clone());
        self.persist()?;
        Ok(task)
    }

    /// Explicit admin verb for closed → open.
    pub fn reopen(&mut self, id: &TaskId, now_ms: u64) -> Result<Task, TaskStoreError> {
        let mut task = self.get(id)?.clone();
        if !task.status.is_closed() {
            return Err(TaskStoreError::NotClosed(id.clone()));
        }
        task.status = TaskStatus::Open;
        task.updated_at_ms = now_ms;
        self.tasks.insert(id.clone(), task.clone());
        self.persist()?;
        Ok(task)
    }

    /// Add a dependency edge `from -> to`. Duplicate adds are no-ops.
    pub fn add_dep(
        &mut self,
        from: &TaskId,
        to: &TaskId,
        now_ms: u64,
    ) -> Result<(), TaskStoreError> {
        self.get(from)?;
        if !self.tasks.contains_key(to) {
            return Err(TaskStoreError::UnknownDependency(to.clone()));
        }
        if self.get(from)?.depends_on.contains(to) {
            return Ok(());
        }
        // DFS from `to` back to `from` over the current graph before commit
        if self.reaches(to, from) {
            return Err(TaskStoreError::DependencyCycle {
                from: from.clone(),
                to: to.clone(),
            });
        }
        if let Some(task) = self.tasks.get_mut(from) {
            task.depends_on.insert(to.clone());
            task.updated_at_ms = now_ms;
        }
        self.persist()?;
        Ok(())
    }

    /// Remove a dependency edge. Removing a non-existent edge is a no-op.
    pub fn remove_dep(
        &mut self,
        from: &TaskId,
        to: &TaskId,
        now_ms: u64,
    ) -> Result<(), TaskStoreError> {
        self.get(from)?;
        let removed = match self.tasks.get_mut(from) {
            Some(task) => {
                let removed = task.depends_on.remove(to);
                if removed {
                    task.updated_at_ms = now_ms;
                }
                removed
            }
            None => false,
        };
        if removed {
            self.persist()?;
        }
        Ok(())
    }

    /// Whether `from` can reach `target` following `depends_on` edges.
    fn reaches(&self, from: &TaskId, target: &TaskId) -> bool {
        let mut stack = vec![from.clone()];
        let mut seen: BTreeSet<TaskId> = BTreeSet::new();
        while let Some(current) = stack.pop() {
            if &current == target {
                return true;
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(task) = self.tasks.get(&current) {
                stack.extend(task.depends_on.iter().cloned());
            }
        }
        false
    }

    fn deps_closed(&self, task: &Task) -> bool {
        task.depends_on
            .iter()
            .all(|dep| self.tasks.get(dep).is_some_and(|t| t.status.is_closed()))
    }

    /// Ready queue: open tasks whose dependencies are all closed, sorted by
    /// (priority asc, created_at asc).
    pub fn ready(&self) -> Vec<Task> {
        let mut ready: Vec<Task> = self
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::Open && self.deps_closed(t))
            .cloned()
            .collect();
        ready.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then(a.created_at_ms.cmp(&b.created_at_ms))
                .then(a.id.cmp(&b.id))
        });
        ready
    }

    /// Tasks that cannot run: explicitly blocked, or open with an unclosed
    /// dependency.
    pub fn blocked(&self) -> Vec<Task> {
        self.tasks
            .values()
            .filter(|t| {
                t.status == TaskStatus::Blocked
                    || (t.status == TaskStatus::Open && !self.deps_closed(t))
            })
            .cloned()
            .collect()
    }

    pub fn by_assignee(&self, agent: &str) -> Vec<Task> {
        self.tasks
            .values()
            .filter(|t| t.assignee.as_deref() == Some(agent))
            .cloned()
            .collect()
    }

    pub fn show(&self, id: &TaskId) -> Result<Task, TaskStoreError> {
        self.get(id).cloned()
    }

    pub fn list(&self, filter: &TaskFilter) -> Vec<Task> {
        self.tasks
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect()
    }

    fn children<'a>(&'a self, id: &'a TaskId) -> impl Iterator<Item = &'a Task> + 'a {
        self.tasks
            .values()
            .filter(move |t| t.parent.as_ref() == Some(id))
    }

    /// Completion counters over an epic's children.
    pub fn epic_progress(&self, id: &TaskId) -> Result<EpicProgress, TaskStoreError> {
        self.get(id)?;
        let mut done = 0;
        let mut total = 0;
        for child in self.children(id) {
            total += 1;
            if child.status.is_closed() {
                done += 1;
            }
        }
        Ok(EpicProgress { done, total })
    }

    /// Close every open epic whose children are all closed; returns the ids
    /// closed, in store order.
    pub fn close_eligible_epics(&mut self, now_ms: u64) -> Result<Vec<TaskId>, TaskStoreError> {
        let eligible: Vec<TaskId> = self
            .tasks
            .values()
            .filter(|t| {
                t.is_epic()
                    && t.status == TaskStatus::Open
                    && t.child_count > 0
                    && self.deps_closed(t)
            })
            .map(|t| t.id.clone())
            .collect();

        for id in &eligible {
            if let Some(task) = self.tasks.get_mut(id) {
                task.status = TaskStatus::Closed;
                task.updated_at_ms = now_ms;
            }
        }
        if !eligible.is_empty() {
            self.persist()?;
        }
        Ok(eligible)
    }

    /// All tasks, in insertion order. Snapshot for the scheduler.
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
#[path = "tasks_tests.rs"]
mod tests;
