//! Dependency specs: wiring, cycles, close gating.

use crate::prelude::*;

#[test]
fn dep_add_gates_readiness_and_close() {
    let project = Project::new();
    let dep = project.create_task("dep", &[]);
    let main = project.create_task("main", &[]);

    project.squad().args(["dep", "add", &main, &dep]).assert().success();

    // main is not ready while dep is open
    let ready = project.run_json(&["ready"]);
    let ids: Vec<&str> = ready
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert!(!ids.contains(&main.as_str()));

    // and cannot close: exit 2
    let (code, stderr) = project.run_err(&["close", &main]);
    assert_eq!(code, 2, "{stderr}");

    // closing the dep unblocks both
    project.run_json(&["close", &dep]);
    let closed = project.run_json(&["close", &main]);
    assert_eq!(closed["status"], "closed");
}

#[test]
fn close_override_skips_the_gate() {
    let project = Project::new();
    let dep = project.create_task("dep", &[]);
    let main = project.create_task("main", &[]);
    project.squad().args(["dep", "add", &main, &dep]).assert().success();

    let closed = project.run_json(&["close", &main, "--override"]);
    assert_eq!(closed["status"], "closed");
}

#[test]
fn dependency_cycle_is_rejected() {
    let project = Project::new();
    let a = project.create_task("a", &[]);
    let b = project.create_task("b", &[]);

    project.squad().args(["dep", "add", &a, &b]).assert().success();
    let (code, stderr) = project.run_err(&["dep", "add", &b, &a]);
    assert_eq!(code, 1, "{stderr}");
    assert!(stderr.contains("cycle"), "{stderr}");
}

#[test]
fn duplicate_dep_add_is_a_noop() {
    let project = Project::new();
    let a = project.create_task("a", &[]);
    let b = project.create_task("b", &[]);
    project.squad().args(["dep", "add", &a, &b]).assert().success();
    project.squad().args(["dep", "add", &a, &b]).assert().success();

    let task = project.run_json(&["show", &a]);
    assert_eq!(task["depends_on"].as_array().unwrap().len(), 1);
}

#[test]
fn dep_remove_unblocks() {
    let project = Project::new();
    let a = project.create_task("a", &[]);
    let b = project.create_task("b", &[]);
    project.squad().args(["dep", "add", &a, &b]).assert().success();
    project
        .squad()
        .args(["dep", "remove", &a, &b])
        .assert()
        .success();

    let task = project.run_json(&["show", &a]);
    assert!(task["depends_on"].as_array().is_none_or(|d| d.is_empty()));
}
