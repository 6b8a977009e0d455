// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use squad_core::SeqNameGen;

fn open_registry(dir: &tempfile::TempDir) -> AgentRegistry {
    AgentRegistry::open(&dir.path().join("agents.db")).unwrap()
}

#[test]
fn register_with_omitted_name_invents_one() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = open_registry(&dir);
    let names = SeqNameGen::new();
    let agent = registry
        .register(None, "claude-code", "opus", &names, 10)
        .unwrap();
    assert!(squad_core::names::is_dictionary_name(&agent.name));
    assert_eq!(agent.program, "claude-code");
    assert_eq!(agent.created_at_ms, 10);
}

#[test]
fn register_is_idempotent_on_name() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = open_registry(&dir);
    let names = SeqNameGen::new();
    let first = registry
        .register(Some("AlphaGlade"), "claude-code", "opus", &names, 10)
        .unwrap();
    let second = registry
        .register(Some("AlphaGlade"), "other-program", "haiku", &names, 99)
        .unwrap();
    assert_eq!(second, first);
    assert_eq!(registry.len(), 1);
}

#[test]
fn invented_names_skip_taken_ones() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = open_registry(&dir);
    let names = SeqNameGen::new();
    let taken = names.candidate(); // first dictionary entry
    registry
        .register(Some(&taken), "claude-code", "opus", &SeqNameGen::new(), 1)
        .unwrap();
    // A fresh generator replays the same sequence; the registry must skip
    // over the collision.
    let agent = registry
        .register(None, "claude-code", "opus", &SeqNameGen::new(), 2)
        .unwrap();
    assert_ne!(agent.name, taken);
}

#[test]
fn recent_sorted_by_last_active_desc() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = open_registry(&dir);
    let names = SeqNameGen::new();
    registry
        .register(Some("AlphaGlade"), "p", "m", &names, 1_000)
        .unwrap();
    registry
        .register(Some("BetaRidge"), "p", "m", &names, 2_000)
        .unwrap();
    registry.touch("AlphaGlade", 5_000).unwrap();

    let recent = registry.recent(Duration::from_secs(60), 6_000);
    let names: Vec<&str> = recent.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["AlphaGlade", "BetaRidge"]);
}

#[test]
fn recent_excludes_stale_agents() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = open_registry(&dir);
    registry
        .register(Some("AlphaGlade"), "p", "m", &SeqNameGen::new(), 1_000)
        .unwrap();
    let now = 1_000 + Duration::from_secs(120).as_millis() as u64;
    assert!(registry.recent(Duration::from_secs(60), now).is_empty());
}

#[test]
fn purge_drops_old_agents() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = open_registry(&dir);
    registry
        .register(Some("AlphaGlade"), "p", "m", &SeqNameGen::new(), 0)
        .unwrap();
    registry
        .register(Some("BetaRidge"), "p", "m", &SeqNameGen::new(), 5_000)
        .unwrap();
    let removed = registry
        .purge(Duration::from_millis(2_000), 6_000)
        .unwrap();
    assert_eq!(removed, 1);
    assert!(registry.get("AlphaGlade").is_none());
    assert!(registry.get("BetaRidge").is_some());
}

#[test]
fn registry_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agents.db");
    {
        let mut registry = AgentRegistry::open(&path).unwrap();
        registry
            .register(Some("AlphaGlade"), "claude-code", "opus", &SeqNameGen::new(), 7)
            .unwrap();
    }
    let registry = AgentRegistry::open(&path).unwrap();
    assert_eq!(registry.get("AlphaGlade").map(|a| a.created_at_ms), Some(7));
}
