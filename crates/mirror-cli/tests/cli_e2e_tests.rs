//! Black-box tests for the `mirror` binary.
//!
//! These spawn the compiled executable and assert on exit codes and terminal
//! output. Color codes never appear because the output is piped.

use assert_cmd::Command;
use mirror_remote::RemoteRepo;
use mirror_test_utils::{origin_with_commit, record_with_origin};
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get a Command for the mirror binary
fn mirror_cmd() -> Command {
    Command::cargo_bin("mirror").expect("Failed to find mirror binary")
}

fn write_catalog(dir: &Path, records: &[RemoteRepo]) -> PathBuf {
    let path = dir.join("catalog.json");
    fs::write(&path, serde_json::to_vec_pretty(records).unwrap()).unwrap();
    path
}

#[test]
fn test_help_lists_every_command() {
    mirror_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("sync")
            .and(predicate::str::contains("plan"))
            .and(predicate::str::contains("status"))
            .and(predicate::str::contains("list")),
    );
}

#[test]
fn test_missing_root_is_a_user_error() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("config.toml");
    fs::write(&config, "catalog = \"/data/catalog.json\"\n").unwrap();

    mirror_cmd()
        .env_remove("MIRROR_ROOT")
        .env_remove("MIRROR_CATALOG")
        .arg("list")
        .arg("--config")
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--root"));
}

#[test]
fn test_sync_clones_catalog_through_the_binary() {
    let temp = TempDir::new().unwrap();
    let origin = temp.path().join("origin");
    origin_with_commit(&origin);
    let catalog = write_catalog(
        temp.path(),
        &[record_with_origin("acme", "widgets", &origin)],
    );
    let tree = temp.path().join("mirror");

    mirror_cmd()
        .arg("sync")
        .arg("--root")
        .arg(&tree)
        .arg("--catalog")
        .arg(&catalog)
        .assert()
        .success()
        .stdout(predicate::str::contains("Done in").and(predicate::str::contains("1 cloned")));

    assert!(tree.join("acme/widgets/.git").is_dir());
    assert!(tree.join("acme/widgets/README.md").is_file());
    let logs: Vec<_> = fs::read_dir(tree.join(".mirror/logs")).unwrap().collect();
    assert_eq!(logs.len(), 1);
}

#[test]
fn test_plan_is_read_only() {
    let temp = TempDir::new().unwrap();
    let origin = temp.path().join("origin");
    origin_with_commit(&origin);
    let catalog = write_catalog(
        temp.path(),
        &[record_with_origin("acme", "widgets", &origin)],
    );
    let tree = temp.path().join("mirror");

    mirror_cmd()
        .arg("plan")
        .arg("--root")
        .arg(&tree)
        .arg("--catalog")
        .arg(&catalog)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("clone")
                .and(predicate::str::contains("1 of 1 actions would run")),
        );

    assert!(!tree.join("acme").exists());
}

#[test]
fn test_unknown_repo_selection_fails() {
    let temp = TempDir::new().unwrap();
    let origin = temp.path().join("origin");
    origin_with_commit(&origin);
    let catalog = write_catalog(
        temp.path(),
        &[record_with_origin("acme", "widgets", &origin)],
    );
    let tree = temp.path().join("mirror");

    mirror_cmd()
        .arg("sync")
        .arg("--root")
        .arg(&tree)
        .arg("--catalog")
        .arg(&catalog)
        .arg("--repo")
        .arg("acme/nope")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not in the catalog: acme/nope"));

    assert!(!tree.join("acme").exists());
}

#[test]
fn test_failed_clone_exits_with_code_two() {
    let temp = TempDir::new().unwrap();
    let catalog = write_catalog(
        temp.path(),
        &[record_with_origin("acme", "gone", &temp.path().join("missing"))],
    );
    let tree = temp.path().join("mirror");

    mirror_cmd()
        .arg("sync")
        .arg("--root")
        .arg(&tree)
        .arg("--catalog")
        .arg(&catalog)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("FAIL").and(predicate::str::contains("1 failed")));
}
