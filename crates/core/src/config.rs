// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Layered configuration: defaults, project `.squad/config.toml`, then
//! `SQUAD_*` environment variables.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Directory under the project root holding all durable state.
pub const STATE_DIR_NAME: &str = ".squad";

/// Errors loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Resolved configuration for one project.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreConfig {
    /// Session name prefix, e.g. `squad-`
    pub session_prefix: String,
    /// Heartbeat window before a silent live session is declared dead
    pub stale_timeout: Duration,
    /// How long a `complete` session lingers before cleanup
    pub complete_grace: Duration,
    /// Project-wide review default override (`review` | `auto`)
    pub review_default: Option<String>,
    /// Override for the install root (`SQUAD_INSTALL_DIR`)
    pub install_dir: Option<PathBuf>,
    /// Gateway bind address
    pub http_addr: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            session_prefix: "squad-".into(),
            stale_timeout: Duration::from_secs(600),
            complete_grace: Duration::from_secs(900),
            review_default: None,
            install_dir: None,
            http_addr: "127.0.0.1:7333".into(),
        }
    }
}

/// On-disk shape of `.squad/config.toml`.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    project: ProjectSection,
    #[serde(default)]
    daemon: DaemonSection,
}

#[derive(Debug, Default, Deserialize)]
struct ProjectSection {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DaemonSection {
    session_prefix: Option<String>,
    stale_timeout_sec: Option<u64>,
    complete_grace_sec: Option<u64>,
    review_default: Option<String>,
    http_addr: Option<String>,
}

impl CoreConfig {
    /// Load configuration for a project root, applying the file then the
    /// environment on top of the defaults.
    pub fn load(project_root: &Path) -> Result<Self, ConfigError> {
        let mut config = CoreConfig::default();
        if let Some(file) = read_config_file(project_root)? {
            if let Some(prefix) = file.daemon.session_prefix {
                config.session_prefix = prefix;
            }
            if let Some(secs) = file.daemon.stale_timeout_sec {
                config.stale_timeout = Duration::from_secs(secs);
            }
            if let Some(secs) = file.daemon.complete_grace_sec {
                config.complete_grace = Duration::from_secs(secs);
            }
            if let Some(action) = file.daemon.review_default {
                config.review_default = Some(action);
            }
            if let Some(addr) = file.daemon.http_addr {
                config.http_addr = addr;
            }
        }
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Some(secs) = env_u64("SQUAD_STALE_TIMEOUT_SEC") {
            self.stale_timeout = Duration::from_secs(secs);
        }
        if let Ok(action) = std::env::var("SQUAD_REVIEW_DEFAULT") {
            if !action.is_empty() {
                self.review_default = Some(action);
            }
        }
        if let Ok(dir) = std::env::var("SQUAD_INSTALL_DIR") {
            if !dir.is_empty() {
                self.install_dir = Some(PathBuf::from(dir));
            }
        }
        if let Ok(addr) = std::env::var("SQUAD_HTTP_ADDR") {
            if !addr.is_empty() {
                self.http_addr = addr;
            }
        }
    }
}

fn env_u64(var: &str) -> Option<u64> {
    std::env::var(var).ok().and_then(|s| s.parse().ok())
}

fn read_config_file(project_root: &Path) -> Result<Option<ConfigFile>, ConfigError> {
    let path = project_root.join(STATE_DIR_NAME).join("config.toml");
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let file = toml::from_str(&text).map_err(|source| ConfigError::Parse { path, source })?;
    Ok(Some(file))
}

/// Resolve the project name used as the task id prefix.
///
/// Prefers `[project] name` from the config file, falls back to the root
/// directory name, then to `"default"`. Malformed config files are ignored
/// here — resolution must always succeed.
pub fn resolve_project(project_root: &Path) -> String {
    let configured = read_config_file(project_root)
        .ok()
        .flatten()
        .and_then(|f| f.project.name);
    if let Some(name) = configured {
        if !name.is_empty() {
            return name;
        }
    }
    project_root
        .file_name()
        .and_then(|n| n.to_str())
        .map(sanitize_project)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "default".to_string())
}

/// Make a directory name usable as a task id prefix: lowercase, with
/// anything outside `[a-z0-9_-]` squeezed to a hyphen.
fn sanitize_project(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_hyphen = false;
    for ch in raw.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' {
            out.push(ch);
            last_was_hyphen = false;
        } else if !last_was_hyphen && !out.is_empty() {
            out.push('-');
            last_was_hyphen = true;
        }
    }
    let trimmed = out.trim_matches('-');
    let mut name = trimmed.to_string();
    // Task ids must start with a letter
    if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        name.insert(0, 'p');
    }
    name
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
