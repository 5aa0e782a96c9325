//! Integration tests for project commands: init, export, diff and promote.

mod common;

use common::{TestEnv, write_tree};
use predicates::prelude::*;
use std::fs;

#[test]
fn test_init_creates_project() {
    let env = TestEnv::new();

    env.socratic()
        .args(["init", "--project", "demo", "--source-dir"])
        .arg(env.source_dir())
        .assert()
        .success()
        .stdout(predicate::str::contains("Created project 'demo'"));

    assert!(env.durable_kb().is_dir());
    let metadata = fs::read_to_string(env.project_dir().join("project.yaml")).unwrap();
    assert!(metadata.contains("project_name: demo"));
    assert!(metadata.contains("input_dir:"));
}

#[test]
fn test_init_json_output() {
    let env = TestEnv::new();

    let output = env
        .socratic()
        .args(["--json", "init", "-p", "demo", "-s"])
        .arg(env.source_dir())
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["project"], "demo");
}

#[test]
fn test_init_twice_fails() {
    let env = TestEnv::with_project();

    env.socratic()
        .args(["init", "--project", "demo", "--source-dir"])
        .arg(env.source_dir())
        .assert()
        .failure()
        .stderr(predicate::str::contains("socratic: error: input:"))
        .stderr(predicate::str::contains("Project already exists"));
}

#[test]
fn test_init_missing_source_dir_fails() {
    let env = TestEnv::new();

    env.socratic()
        .args(["init", "--project", "demo", "--source-dir", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Source directory not found"));
}

#[test]
fn test_unknown_project_is_config_error() {
    let env = TestEnv::new();

    env.socratic()
        .args(["export", "--project", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("socratic: error: config:"))
        .stderr(predicate::str::contains("Project directory not found"));
}

#[test]
fn test_export_concatenates_units() {
    let env = TestEnv::with_project();
    write_tree(
        &env.durable_kb(),
        &[("002_b.md", "Second"), ("001_a.md", "First")],
    );

    env.socratic()
        .args(["export", "--project", "demo", "--format", "agentmd"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 file(s)"));

    let exported: Vec<_> = fs::read_dir(env.project_dir())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with("demo_"))
        })
        .collect();
    assert_eq!(exported.len(), 1);
    assert_eq!(fs::read_to_string(&exported[0]).unwrap(), "First\nSecond");
}

#[test]
fn test_export_empty_knowledge_base_fails() {
    let env = TestEnv::with_project();

    env.socratic()
        .args(["export", "--project", "demo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No markdown files"));
}

#[test]
fn test_promote_without_working_copy_fails() {
    let env = TestEnv::with_project();

    env.socratic()
        .args(["promote", "--project", "demo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No working copy"));
}

#[test]
fn test_diff_then_promote() {
    let env = TestEnv::with_project();
    write_tree(&env.durable_kb(), &[("001_a.md", "one\ntwo\n")]);
    write_tree(
        &env.ephemeral_kb(),
        &[("001_a.md", "one\nthree\n"), ("002_b.md", "new\n")],
    );

    env.socratic()
        .args(["diff", "--project", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("+ added    002_b.md"))
        .stdout(predicate::str::contains("-two"))
        .stdout(predicate::str::contains("+three"))
        .stdout(predicate::str::contains("1 added, 0 deleted, 1 modified"));
    assert_eq!(fs::read_to_string(env.durable_kb().join("001_a.md")).unwrap(), "one\ntwo\n");

    env.socratic()
        .args(["promote", "--project", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Promoted working copy."));
    assert_eq!(
        fs::read_to_string(env.durable_kb().join("001_a.md")).unwrap(),
        "one\nthree\n"
    );
    assert!(env.durable_kb().join("002_b.md").exists());

    env.socratic()
        .args(["promote", "--project", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to promote"));
}

#[test]
fn test_action_log_records_commands() {
    let env = TestEnv::with_project();

    env.socratic()
        .env("SOCRATIC_ACTION_LOG", "1")
        .args(["export", "--project", "demo"])
        .assert()
        .failure();

    let log = fs::read_to_string(env.projects_dir().join("action.log")).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 1);
    let entry: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(entry["command"], "export");
    assert_eq!(entry["project"], "demo");
    assert_eq!(entry["success"], false);
    assert!(entry["error"].as_str().unwrap().contains("No markdown files"));
}

#[test]
fn test_action_log_disabled() {
    let env = TestEnv::with_project();

    env.socratic()
        .args(["promote", "--project", "demo"])
        .assert()
        .failure();

    assert!(!env.projects_dir().join("action.log").exists());
}

#[test]
fn test_failed_command_without_projects_root_leaves_no_trace() {
    let env = TestEnv::new();

    env.socratic()
        .env("SOCRATIC_ACTION_LOG", "1")
        .args(["diff", "--project", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Project directory not found"));

    assert!(!env.projects_dir().exists());
}
