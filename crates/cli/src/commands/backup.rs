// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `squad backup` / `squad rollback`.

use crate::client::Context;
use crate::exit_error::ExitError;
use crate::output::print_json;
use anyhow::Result;
use serde_json::json;
use squad_storage::{BackupError, Backups, VerifyOutcome};
use std::path::PathBuf;

pub async fn backup(ctx: &Context, label: Option<String>) -> Result<()> {
    if ctx.daemon_running() {
        let info = ctx.post("/backup", json!({"label": label})).await?;
        if ctx.output.is_json() {
            print_json(&info);
        } else {
            println!("backup written to {}", info["dir"].as_str().unwrap_or("?"));
        }
        return Ok(());
    }

    let backups = Backups::new(&ctx.project_root.join(".squad"));
    let info = backups.backup(label.as_deref()).map_err(backup_err)?;
    if ctx.output.is_json() {
        print_json(&json!({"dir": info.dir, "label": info.label}));
    } else {
        println!("backup written to {}", info.dir.display());
    }
    Ok(())
}

pub async fn rollback(ctx: &Context, dir: &str, force: bool) -> Result<()> {
    if ctx.daemon_running() {
        let result = ctx
            .post("/restore", json!({"dir": resolve_dir(ctx, dir), "force": force}))
            .await?;
        if ctx.output.is_json() {
            print_json(&result);
        } else {
            println!(
                "restored; safety backup at {}",
                result["safety_backup"].as_str().unwrap_or("?")
            );
        }
        return Ok(());
    }

    let backups = Backups::new(&ctx.project_root.join(".squad"));
    let target = resolve_dir(ctx, dir);
    match backups.verify(&target).map_err(backup_err)? {
        VerifyOutcome::Ok => {}
        VerifyOutcome::Mismatch { file } => {
            return Err(ExitError::integrity(format!("backup digest mismatch on {file}")).into());
        }
    }
    // No daemon: nothing live, quiesce count is zero
    let safety = backups.restore(&target, 0, force).map_err(backup_err)?;
    if ctx.output.is_json() {
        print_json(&json!({"restored": target, "safety_backup": safety.dir}));
    } else {
        println!("restored; safety backup at {}", safety.dir.display());
    }
    Ok(())
}

/// Accept either a full path or a name under `.squad/backups/`.
fn resolve_dir(ctx: &Context, dir: &str) -> PathBuf {
    let direct = PathBuf::from(dir);
    if direct.is_dir() {
        return direct;
    }
    ctx.project_root.join(".squad").join("backups").join(dir)
}

fn backup_err(e: BackupError) -> anyhow::Error {
    let exit = match &e {
        BackupError::DigestMismatch { .. } => ExitError::integrity(e.to_string()),
        BackupError::NotQuiesced(_) => ExitError::state(e.to_string()),
        BackupError::NotABackup(_) => ExitError::user(e.to_string()),
        BackupError::Io { .. } => ExitError::state(e.to_string()),
    };
    exit.into()
}
