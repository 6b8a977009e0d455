// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic single-file persistence shared by all stores.
//!
//! The durability point is the directory fsync after the rename: a crash at
//! any earlier step leaves the previous document intact.

use serde::{de::DeserializeOwned, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from store persistence
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The persisted document failed a consistency check. The core refuses
    /// to serve from a store in this state; recovery goes through backups.
    #[error("integrity failure in {path}: {message}")]
    Integrity { path: PathBuf, message: String },
}

fn io_err(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_owned(),
        source,
    }
}

/// Write `document` to `path` atomically with full fsync discipline.
pub fn write_atomic<T: Serialize>(path: &Path, document: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    let tmp_path = path.with_extension("tmp");
    let json = serde_json::to_vec_pretty(document)?;

    {
        let mut tmp = File::create(&tmp_path).map_err(|e| io_err(&tmp_path, e))?;
        tmp.write_all(&json).map_err(|e| io_err(&tmp_path, e))?;
        tmp.sync_all().map_err(|e| io_err(&tmp_path, e))?;
    }

    std::fs::rename(&tmp_path, path).map_err(|e| io_err(path, e))?;

    if let Some(parent) = path.parent() {
        let dir = File::open(parent).map_err(|e| io_err(parent, e))?;
        dir.sync_all().map_err(|e| io_err(parent, e))?;
    }

    Ok(())
}

/// Write raw bytes to `path` with the same atomicity as [`write_atomic`].
pub fn write_atomic_bytes(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("tmp");
    {
        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(bytes)?;
        tmp.sync_all()?;
    }
    std::fs::rename(&tmp_path, path)?;
    if let Some(parent) = path.parent() {
        File::open(parent)?.sync_all()?;
    }
    Ok(())
}

/// Load a document from `path`, or `None` if the file does not exist.
///
/// A present-but-unparseable document is an [`StoreError::Integrity`]
/// failure, never silently replaced.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    match serde_json::from_str(&text) {
        Ok(document) => Ok(Some(document)),
        Err(e) => Err(StoreError::Integrity {
            path: path.to_owned(),
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
