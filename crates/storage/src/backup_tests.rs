// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn seed_state(dir: &Path, tasks: &str, agents: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join("tasks.db"), tasks).unwrap();
    std::fs::write(dir.join("agents.db"), agents).unwrap();
}

#[test]
fn backup_copies_stores_with_digests() {
    let dir = tempfile::tempdir().unwrap();
    seed_state(dir.path(), "{\"tasks\":1}", "{\"agents\":1}");
    let backups = Backups::new(dir.path());

    let info = backups.backup(Some("mylabel")).unwrap();
    assert!(info
        .dir
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .ends_with("_mylabel"));
    assert!(info.dir.join("tasks.db.backup").exists());
    assert!(info.dir.join("tasks.db.sha256").exists());
    assert!(info.dir.join("agents.db.backup").exists());
    assert!(info.dir.join("metadata.txt").exists());

    let metadata = std::fs::read_to_string(info.dir.join("metadata.txt")).unwrap();
    assert!(metadata.contains("label: mylabel"));
    assert!(metadata.contains("tasks.db: "));
}

#[test]
fn verify_detects_tampering() {
    let dir = tempfile::tempdir().unwrap();
    seed_state(dir.path(), "{}", "{}");
    let backups = Backups::new(dir.path());
    let info = backups.backup(None).unwrap();

    assert_eq!(backups.verify(&info.dir).unwrap(), VerifyOutcome::Ok);

    std::fs::write(info.dir.join("tasks.db.backup"), "{\"tampered\":true}").unwrap();
    assert_eq!(
        backups.verify(&info.dir).unwrap(),
        VerifyOutcome::Mismatch {
            file: "tasks.db".into()
        }
    );
}

#[test]
fn verify_rejects_non_backup_directories() {
    let dir = tempfile::tempdir().unwrap();
    let backups = Backups::new(dir.path());
    assert!(matches!(
        backups.verify(dir.path()),
        Err(BackupError::NotABackup(_))
    ));
}

#[test]
fn restore_roundtrip_preserves_content() {
    let dir = tempfile::tempdir().unwrap();
    seed_state(dir.path(), "{\"generation\":1}", "{}");
    let backups = Backups::new(dir.path());
    let info = backups.backup(None).unwrap();

    // Mutate current state, then roll back
    std::fs::write(dir.path().join("tasks.db"), "{\"generation\":2}").unwrap();
    backups.restore(&info.dir, 0, false).unwrap();

    let restored = std::fs::read_to_string(dir.path().join("tasks.db")).unwrap();
    assert_eq!(restored, "{\"generation\":1}");
}

#[test]
fn restore_takes_safety_backup_first() {
    let dir = tempfile::tempdir().unwrap();
    seed_state(dir.path(), "{\"generation\":1}", "{}");
    let backups = Backups::new(dir.path());
    let info = backups.backup(None).unwrap();

    std::fs::write(dir.path().join("tasks.db"), "{\"generation\":2}").unwrap();
    let safety = backups.restore(&info.dir, 0, false).unwrap();

    let saved = std::fs::read_to_string(safety.dir.join("tasks.db.backup")).unwrap();
    assert_eq!(saved, "{\"generation\":2}");
}

#[test]
fn restore_refuses_while_sessions_active() {
    let dir = tempfile::tempdir().unwrap();
    seed_state(dir.path(), "{}", "{}");
    let backups = Backups::new(dir.path());
    let info = backups.backup(None).unwrap();

    assert!(matches!(
        backups.restore(&info.dir, 2, false),
        Err(BackupError::NotQuiesced(2))
    ));
    assert!(backups.restore(&info.dir, 2, true).is_ok());
}

#[test]
fn backup_restore_backup_digests_match() {
    let dir = tempfile::tempdir().unwrap();
    seed_state(dir.path(), "{\"stable\":true}", "{\"a\":1}");
    let backups = Backups::new(dir.path());

    let first = backups.backup(Some("one")).unwrap();
    backups.restore(&first.dir, 0, false).unwrap();
    let second = backups.backup(Some("two")).unwrap();

    let digest_a = std::fs::read_to_string(first.dir.join("tasks.db.sha256")).unwrap();
    let digest_b = std::fs::read_to_string(second.dir.join("tasks.db.sha256")).unwrap();
    assert_eq!(digest_a, digest_b);
}

#[test]
fn list_returns_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    seed_state(dir.path(), "{}", "{}");
    let backups = Backups::new(dir.path());
    backups.backup(Some("a")).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(1100));
    let newest = backups.backup(Some("b")).unwrap();

    let listed = backups.list().unwrap();
    assert_eq!(listed.first(), Some(&newest.dir));
}
