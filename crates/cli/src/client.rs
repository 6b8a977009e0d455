// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway client with a direct-store fallback.
//!
//! When a daemon holds the project lock every verb goes over HTTP. With
//! no daemon running, task verbs operate on the stores directly; session
//! and signal verbs need the daemon and say so.

use crate::exit_error::ExitError;
use crate::output::OutputFormat;
use anyhow::Result;
use serde_json::Value;
use squad_core::{resolve_project, Clock, CoreConfig, SystemClock, TaskId, TaskPatch};
use squad_daemon::lifecycle::lock_is_held;
use squad_storage::{TaskFilter, TaskSpec, TaskStore, TaskStoreError};
use std::path::PathBuf;

/// Resolved invocation context.
pub struct Context {
    pub project_root: PathBuf,
    pub output: OutputFormat,
    pub config: CoreConfig,
    backend: Backend,
}

enum Backend {
    Http { base: String, http: reqwest::Client },
    Direct,
}

impl Context {
    pub async fn new(project_root: PathBuf, output: OutputFormat) -> Result<Context> {
        let config = CoreConfig::load(&project_root)?;
        let lock_path = project_root.join(".squad").join("daemon.pid");
        let backend = if lock_is_held(&lock_path) {
            Backend::Http {
                base: format!("http://{}", config.http_addr),
                http: reqwest::Client::new(),
            }
        } else {
            Backend::Direct
        };
        Ok(Context {
            project_root,
            output,
            config,
            backend,
        })
    }

    pub fn daemon_running(&self) -> bool {
        matches!(self.backend, Backend::Http { .. })
    }

    // --- HTTP ------------------------------------------------------------

    fn http(&self) -> Result<(&str, &reqwest::Client)> {
        match &self.backend {
            Backend::Http { base, http } => Ok((base.as_str(), http)),
            Backend::Direct => Err(ExitError::state(
                "no daemon is running (start one with `squad daemon start`)",
            )
            .into()),
        }
    }

    pub async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value> {
        let (base, http) = self.http()?;
        let mut request = http.request(method, format!("{base}{path}"));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ExitError::state(format!("daemon unreachable: {e}")))?;
        let status = response.status();
        let value: Value = response.json().await.unwrap_or(Value::Null);
        if status.is_success() {
            return Ok(value);
        }
        let kind = value["error"].as_str().unwrap_or("internal").to_string();
        let message = value["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| format!("daemon returned {status}"));
        Err(ExitError::from_kind(&kind, message).into())
    }

    pub async fn get(&self, path: &str) -> Result<Value> {
        self.request(reqwest::Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.request(reqwest::Method::POST, path, Some(body)).await
    }

    // --- direct store access ---------------------------------------------

    fn open_tasks(&self) -> Result<TaskStore> {
        let project = resolve_project(&self.project_root);
        let path = self.project_root.join(".squad").join("tasks.db");
        TaskStore::open(&path, &project).map_err(task_err)
    }

    fn now_ms(&self) -> u64 {
        SystemClock.epoch_ms()
    }

    // --- task verbs (both modes) ------------------------------------------

    pub async fn task_create(&self, spec: TaskSpec) -> Result<Value> {
        if self.daemon_running() {
            return self.post("/tasks", serde_json::to_value(spec)?).await;
        }
        let mut tasks = self.open_tasks()?;
        let task = tasks.create(spec, self.now_ms()).map_err(task_err)?;
        Ok(serde_json::to_value(task)?)
    }

    pub async fn task_list(&self, filter: &TaskFilter) -> Result<Value> {
        if self.daemon_running() {
            let query = filter_query(filter)?;
            return self.get(&format!("/tasks{query}")).await;
        }
        let tasks = self.open_tasks()?;
        Ok(serde_json::to_value(tasks.list(filter))?)
    }

    pub async fn task_show(&self, id: &TaskId) -> Result<Value> {
        if self.daemon_running() {
            return self.get(&format!("/tasks/{id}")).await;
        }
        let tasks = self.open_tasks()?;
        Ok(serde_json::to_value(tasks.show(id).map_err(task_err)?)?)
    }

    pub async fn task_update(&self, id: &TaskId, patch: TaskPatch) -> Result<Value> {
        if self.daemon_running() {
            return self
                .request(
                    reqwest::Method::PATCH,
                    &format!("/tasks/{id}"),
                    Some(serde_json::to_value(patch)?),
                )
                .await;
        }
        let mut tasks = self.open_tasks()?;
        let task = tasks.update(id, patch, self.now_ms()).map_err(task_err)?;
        Ok(serde_json::to_value(task)?)
    }

    pub async fn task_close(&self, id: &TaskId, override_deps: bool) -> Result<Value> {
        if self.daemon_running() {
            let query = if override_deps { "?override=true" } else { "" };
            return self
                .request(reqwest::Method::DELETE, &format!("/tasks/{id}{query}"), None)
                .await;
        }
        let mut tasks = self.open_tasks()?;
        let task = tasks
            .close(id, override_deps, self.now_ms())
            .map_err(task_err)?;
        Ok(serde_json::to_value(task)?)
    }

    pub async fn task_reopen(&self, id: &TaskId) -> Result<Value> {
        if self.daemon_running() {
            return self.post(&format!("/tasks/{id}/reopen"), Value::Null).await;
        }
        let mut tasks = self.open_tasks()?;
        let task = tasks.reopen(id, self.now_ms()).map_err(task_err)?;
        Ok(serde_json::to_value(task)?)
    }

    pub async fn task_ready(&self) -> Result<Value> {
        if self.daemon_running() {
            return self.get("/tasks/ready").await;
        }
        let tasks = self.open_tasks()?;
        Ok(serde_json::to_value(tasks.ready())?)
    }

    pub async fn dep_add(&self, from: &TaskId, to: &TaskId) -> Result<()> {
        if self.daemon_running() {
            self.post(&format!("/tasks/{from}/deps"), serde_json::json!({"on": to}))
                .await?;
            return Ok(());
        }
        let mut tasks = self.open_tasks()?;
        tasks.add_dep(from, to, self.now_ms()).map_err(task_err)?;
        Ok(())
    }

    pub async fn dep_remove(&self, from: &TaskId, to: &TaskId) -> Result<()> {
        if self.daemon_running() {
            self.request(
                reqwest::Method::DELETE,
                &format!("/tasks/{from}/deps/{to}"),
                None,
            )
            .await?;
            return Ok(());
        }
        let mut tasks = self.open_tasks()?;
        tasks
            .remove_dep(from, to, self.now_ms())
            .map_err(task_err)?;
        Ok(())
    }

    pub async fn epic_close_eligible(&self) -> Result<Value> {
        if self.daemon_running() {
            return self.get("/epic/close-eligible").await;
        }
        let mut tasks = self.open_tasks()?;
        let closed = tasks
            .close_eligible_epics(self.now_ms())
            .map_err(task_err)?;
        Ok(serde_json::to_value(closed)?)
    }

    pub async fn epic_progress(&self, id: &TaskId) -> Result<Value> {
        if self.daemon_running() {
            return self.get(&format!("/epic/{id}/progress")).await;
        }
        let tasks = self.open_tasks()?;
        Ok(serde_json::to_value(
            tasks.epic_progress(id).map_err(task_err)?,
        )?)
    }
}

/// Map store errors onto exit codes: integrity 3, state violations 2,
/// everything user-shaped 1.
fn task_err(e: TaskStoreError) -> anyhow::Error {
    let exit = match &e {
        TaskStoreError::Store(squad_storage::StoreError::Integrity { .. }) => {
            ExitError::integrity(e.to_string())
        }
        TaskStoreError::OpenDependencies { .. }
        | TaskStoreError::ParentClosed(_)
        | TaskStoreError::NotClosed(_) => ExitError::state(e.to_string()),
        TaskStoreError::Task(
            squad_core::TaskError::InvalidTransition { .. }
            | squad_core::TaskError::AssigneeRequired,
        ) => ExitError::state(e.to_string()),
        _ => ExitError::user(e.to_string()),
    };
    exit.into()
}

/// Render a TaskFilter as a query string (empty when no filters set).
fn filter_query(filter: &TaskFilter) -> Result<String> {
    let value = serde_json::to_value(filter)?;
    let mut parts: Vec<String> = Vec::new();
    if let Some(map) = value.as_object() {
        for (key, val) in map {
            match val {
                Value::String(s) => parts.push(format!("{key}={s}")),
                Value::Null => {}
                other => parts.push(format!("{key}={other}")),
            }
        }
    }
    Ok(if parts.is_empty() {
        String::new()
    } else {
        format!("?{}", parts.join("&"))
    })
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
