//! Backup and rollback specs.

use crate::prelude::*;

#[test]
fn backup_snapshots_the_store() {
    let project = Project::new();
    project.create_task("precious", &[]);

    let info = project.run_json(&["backup", "--label", "before"]);
    let dir = info["dir"].as_str().unwrap();
    assert!(dir.contains("backup_"));
    assert!(std::path::Path::new(dir).join("tasks.db.backup").exists());
    assert!(std::path::Path::new(dir).join("tasks.db.sha256").exists());
    assert!(std::path::Path::new(dir).join("metadata.txt").exists());
}

#[test]
fn rollback_restores_and_takes_safety_backup() {
    let project = Project::new();
    let kept = project.create_task("kept", &[]);
    let info = project.run_json(&["backup", "--label", "known-good"]);
    let dir = info["dir"].as_str().unwrap().to_string();

    // Mutate after the snapshot
    let doomed = project.create_task("doomed", &[]);

    let result = project.run_json(&["rollback", &dir]);
    assert!(result["safety_backup"].as_str().is_some());

    // The later task is gone, the earlier one survives
    project.squad().args(["show", &kept]).assert().success();
    let (code, _) = project.run_err(&["show", &doomed]);
    assert_eq!(code, 1);
}

#[test]
fn backup_restore_backup_digests_match() {
    let project = Project::new();
    project.create_task("stable", &[]);

    let first = project.run_json(&["backup", "--label", "one"]);
    let first_dir = first["dir"].as_str().unwrap().to_string();
    project.run_json(&["rollback", &first_dir]);
    let second = project.run_json(&["backup", "--label", "two"]);
    let second_dir = second["dir"].as_str().unwrap().to_string();

    let digest_a =
        std::fs::read_to_string(std::path::Path::new(&first_dir).join("tasks.db.sha256")).unwrap();
    let digest_b =
        std::fs::read_to_string(std::path::Path::new(&second_dir).join("tasks.db.sha256")).unwrap();
    assert_eq!(digest_a, digest_b);
}

#[test]
fn tampered_backup_fails_verification_on_rollback() {
    let project = Project::new();
    project.create_task("precious", &[]);
    let info = project.run_json(&["backup", "--label", "tampered"]);
    let dir = info["dir"].as_str().unwrap().to_string();

    std::fs::write(
        std::path::Path::new(&dir).join("tasks.db.backup"),
        "{\"forged\":true}",
    )
    .unwrap();

    let (code, stderr) = project.run_err(&["rollback", &dir]);
    assert_eq!(code, 3, "{stderr}");
    assert!(stderr.contains("mismatch"), "{stderr}");
}

#[test]
fn rollback_accepts_backup_names() {
    let project = Project::new();
    project.create_task("named", &[]);
    let info = project.run_json(&["backup", "--label", "byname"]);
    let name = std::path::Path::new(info["dir"].as_str().unwrap())
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    project.squad().args(["rollback", &name]).assert().success();
}
