// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task selection.
//!
//! Pure decisions over a consistent snapshot: identical inputs yield
//! identical outputs. The supervisor takes the snapshot under one read
//! critical section and applies the result atomically.

use squad_core::{FileReservation, Task, TaskStatus};
use std::collections::BTreeSet;
use std::collections::HashMap;

/// Consistent snapshot the scheduler decides over.
pub struct SchedulerView<'a> {
    pub tasks: &'a [Task],
    pub reservations: &'a [FileReservation],
}

impl SchedulerView<'_> {
    fn deps_closed(&self, task: &Task, by_id: &HashMap<&str, &Task>) -> bool {
        task.depends_on
            .iter()
            .all(|dep| by_id.get(dep.as_str()).is_some_and(|t| t.status.is_closed()))
    }

    /// Tasks another agent holds file reservations under.
    fn conflicted_tasks(&self, requester: &str) -> BTreeSet<&str> {
        self.reservations
            .iter()
            .filter(|r| r.agent != requester)
            .map(|r| r.task.as_str())
            .collect()
    }
}

/// Pick the next task for a requesting agent.
///
/// Candidates are ready tasks (open, all deps closed) that are unassigned
/// or already assigned to the requester — epics whose children are still
/// open are excluded by the readiness rule itself. Ranking: tasks already
/// assigned to this agent, then lowest priority number, then tasks free of
/// other agents' reservations, then earliest created_at.
pub fn next_task(view: &SchedulerView<'_>, agent: &str) -> Option<Task> {
    let by_id: HashMap<&str, &Task> = view
        .tasks
        .iter()
        .map(|t| (t.id.as_str(), t))
        .collect();
    let conflicted = view.conflicted_tasks(agent);

    view.tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Open)
        .filter(|t| view.deps_closed(t, &by_id))
        .filter(|t| match t.assignee.as_deref() {
            None => true,
            Some(assigned) => assigned == agent,
        })
        .min_by_key(|t| {
            (
                t.assignee.as_deref() != Some(agent),
                t.priority,
                conflicted.contains(t.id.as_str()),
                t.created_at_ms,
                t.id.clone(),
            )
        })
        .cloned()
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
