//! Epic specs: child ids, auto-wired dependencies, roll-up.

use crate::prelude::*;

#[test]
fn linear_epic_rollup() {
    let project = Project::new();
    let epic = project.create_task("the epic", &["--type", "epic"]);
    let c1 = project.create_task("first child", &["--parent", &epic]);
    let c2 = project.create_task("second child", &["--parent", &epic]);

    assert_eq!(c1, format!("{epic}.1"));
    assert_eq!(c2, format!("{epic}.2"));

    // Ready contains the children, not the epic (it depends on them)
    let ready = project.run_json(&["ready"]);
    let ids: Vec<&str> = ready
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![c1.as_str(), c2.as_str()]);

    // Close the first child: epic not yet eligible
    project.run_json(&["close", &c1]);
    let progress = project.run_json(&["epic", "progress", &epic]);
    assert_eq!(progress["done"], 1);
    assert_eq!(progress["total"], 2);
    let eligible = project.run_json(&["epic", "close-eligible"]);
    assert!(eligible.as_array().unwrap().is_empty());

    let ready = project.run_json(&["ready"]);
    let ids: Vec<&str> = ready
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![c2.as_str()]);

    // Close the second: roll-up closes the epic
    project.run_json(&["close", &c2]);
    let eligible = project.run_json(&["epic", "close-eligible"]);
    assert_eq!(eligible.as_array().unwrap().len(), 1);
    assert_eq!(eligible[0], epic.as_str());

    let task = project.run_json(&["show", &epic]);
    assert_eq!(task["status"], "closed");
}

#[test]
fn epic_depends_on_every_child() {
    let project = Project::new();
    let epic = project.create_task("epic", &["--type", "epic"]);
    project.create_task("one", &["--parent", &epic]);
    project.create_task("two", &["--parent", &epic]);

    let task = project.run_json(&["show", &epic]);
    assert_eq!(task["depends_on"].as_array().unwrap().len(), 2);
}

#[test]
fn children_of_closed_parents_are_rejected() {
    let project = Project::new();
    let root = project.create_task("root", &[]);
    project.run_json(&["close", &root]);
    let (code, stderr) = project.run_err(&["create", "late child", "--parent", &root]);
    assert_eq!(code, 2, "{stderr}");
    assert!(stderr.contains("closed"), "{stderr}");
}
