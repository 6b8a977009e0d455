// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timestamped snapshots of the durable stores with checksum verification.
//!
//! A backup directory holds a `.backup` copy and a `.sha256` digest per
//! store file plus a human-readable `metadata.txt`. Restore always takes a
//! pre-rollback safety backup first.

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Store files included in a snapshot.
const STORE_FILES: &[&str] = &["tasks.db", "agents.db"];

/// Errors from backup operations
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("not a backup directory: {0}")]
    NotABackup(PathBuf),
    #[error("integrity failure: {file} digest mismatch")]
    DigestMismatch { file: String },
    #[error("refusing restore: {0} active sessions (pass force to override)")]
    NotQuiesced(usize),
}

fn io_err(path: &Path, source: std::io::Error) -> BackupError {
    BackupError::Io {
        path: path.to_owned(),
        source,
    }
}

/// Verification result for a backup directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    Ok,
    Mismatch { file: String },
}

/// A created snapshot.
#[derive(Debug, Clone)]
pub struct BackupInfo {
    pub dir: PathBuf,
    pub label: Option<String>,
}

/// Backup manager rooted at a project state directory (`.squad`).
pub struct Backups {
    state_dir: PathBuf,
}

impl Backups {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            state_dir: state_dir.to_owned(),
        }
    }

    fn backups_dir(&self) -> PathBuf {
        self.state_dir.join("backups")
    }

    /// Snapshot both stores into a fresh timestamped directory.
    pub fn backup(&self, label: Option<&str>) -> Result<BackupInfo, BackupError> {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let name = match label {
            Some(label) => format!("backup_{stamp}_{label}"),
            None => format!("backup_{stamp}"),
        };
        let dir = self.backups_dir().join(name);
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;

        let mut metadata = String::new();
        metadata.push_str(&format!("created_at: {}\n", Utc::now().to_rfc3339()));
        if let Some(label) = label {
            metadata.push_str(&format!("label: {label}\n"));
        }

        for file in STORE_FILES {
            let source = self.state_dir.join(file);
            if !source.exists() {
                continue;
            }
            let bytes = std::fs::read(&source).map_err(|e| io_err(&source, e))?;
            let digest = sha256_hex(&bytes);

            let copy = dir.join(format!("{file}.backup"));
            std::fs::write(&copy, &bytes).map_err(|e| io_err(&copy, e))?;
            let digest_path = dir.join(format!("{file}.sha256"));
            std::fs::write(&digest_path, format!("{digest}\n")).map_err(|e| io_err(&digest_path, e))?;

            metadata.push_str(&format!("{file}: {digest}\n"));
        }

        let metadata_path = dir.join("metadata.txt");
        std::fs::write(&metadata_path, metadata).map_err(|e| io_err(&metadata_path, e))?;

        // Make the whole snapshot durable before reporting success
        sync_dir(&dir)?;
        sync_dir(&self.backups_dir())?;

        info!(dir = %dir.display(), "backup created");
        Ok(BackupInfo {
            dir,
            label: label.map(str::to_string),
        })
    }

    /// Recompute digests over a backup directory.
    pub fn verify(&self, dir: &Path) -> Result<VerifyOutcome, BackupError> {
        if !dir.join("metadata.txt").exists() {
            return Err(BackupError::NotABackup(dir.to_owned()));
        }
        for file in STORE_FILES {
            let copy = dir.join(format!("{file}.backup"));
            let digest_path = dir.join(format!("{file}.sha256"));
            if !copy.exists() && !digest_path.exists() {
                continue;
            }
            if !copy.exists() || !digest_path.exists() {
                return Ok(VerifyOutcome::Mismatch {
                    file: (*file).to_string(),
                });
            }
            let bytes = std::fs::read(&copy).map_err(|e| io_err(&copy, e))?;
            let recorded = std::fs::read_to_string(&digest_path)
                .map_err(|e| io_err(&digest_path, e))?;
            if recorded.trim() != sha256_hex(&bytes) {
                return Ok(VerifyOutcome::Mismatch {
                    file: (*file).to_string(),
                });
            }
        }
        Ok(VerifyOutcome::Ok)
    }

    /// Replace current stores with the backup's contents.
    ///
    /// `active_sessions` is the caller's quiesce count; a non-zero count is
    /// refused unless `force` is set. A safety backup of the current state
    /// is always taken first.
    pub fn restore(
        &self,
        dir: &Path,
        active_sessions: usize,
        force: bool,
    ) -> Result<BackupInfo, BackupError> {
        if active_sessions > 0 && !force {
            return Err(BackupError::NotQuiesced(active_sessions));
        }
        match self.verify(dir)? {
            VerifyOutcome::Ok => {}
            VerifyOutcome::Mismatch { file } => {
                return Err(BackupError::DigestMismatch { file });
            }
        }

        let safety = self.backup(Some("pre-rollback"))?;

        for file in STORE_FILES {
            let copy = dir.join(format!("{file}.backup"));
            let target = self.state_dir.join(file);
            if copy.exists() {
                let bytes = std::fs::read(&copy).map_err(|e| io_err(&copy, e))?;
                crate::store::write_atomic_bytes(&target, &bytes)
                    .map_err(|e| io_err(&target, e))?;
            } else if target.exists() {
                std::fs::remove_file(&target).map_err(|e| io_err(&target, e))?;
            }
        }

        info!(dir = %dir.display(), safety = %safety.dir.display(), "restore complete");
        Ok(safety)
    }

    /// Existing backup directories, newest first.
    pub fn list(&self) -> Result<Vec<PathBuf>, BackupError> {
        let dir = self.backups_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries: Vec<PathBuf> = std::fs::read_dir(&dir)
            .map_err(|e| io_err(&dir, e))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| {
                p.is_dir()
                    && p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with("backup_"))
            })
            .collect();
        entries.sort();
        entries.reverse();
        Ok(entries)
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn sync_dir(path: &Path) -> Result<(), BackupError> {
    let dir = File::open(path).map_err(|e| io_err(path, e))?;
    dir.sync_all().map_err(|e| io_err(path, e))
}

#[cfg(test)]
#[path = "backup_tests.rs"]
mod tests;
