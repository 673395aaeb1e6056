//! End-to-end sync flows against real repositories on disk.
//!
//! Every test drives the full engine: probe -> plan -> concurrent execute ->
//! report, with the git2 backend cloning and fetching local origin fixtures
//! through their filesystem paths.

use chrono::Utc;
use git2::{BranchType, Repository};
use mirror_core::{BatchReport, Orchestrator, RunLog, RunLogWriter, SkipReason, SyncOptions};
use mirror_git::{FailureKind, GitBackend, GitProbe};
use mirror_remote::{MirrorLayout, RemoteRepo};
use mirror_test_utils::{
    clone_local, commit_file, corrupt_git_dir, days_ago, origin_with_commit, record,
    record_with_origin,
};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

fn run_sync(catalog: &[RemoteRepo], layout: &MirrorLayout, options: &SyncOptions) -> BatchReport {
    let backend = GitBackend;
    let probe = GitProbe;
    Orchestrator::new(&backend, &probe)
        .with_workers(2)
        .run(catalog, layout, options, |_| {})
}

/// Fetch inside an existing clone so its FETCH_HEAD hint is newer than the
/// catalog record's `pushed_at`.
fn mark_fetched(path: &Path, branch: &str) {
    let repo = Repository::open(path).unwrap();
    let mut remote = repo.find_remote("origin").unwrap();
    remote.fetch(&[branch], None, None).unwrap();
}

fn tip_of(path: &Path) -> git2::Oid {
    Repository::open(path)
        .unwrap()
        .head()
        .unwrap()
        .peel_to_commit()
        .unwrap()
        .id()
}

#[test]
fn test_first_run_clones_second_run_updates() {
    let temp = TempDir::new().unwrap();
    let a_origin = temp.path().join("origins/a");
    let b_origin = temp.path().join("origins/b");
    origin_with_commit(&a_origin);
    origin_with_commit(&b_origin);

    let layout = MirrorLayout::new(temp.path().join("mirror"));
    let mut catalog = vec![
        record_with_origin("acme", "a", &a_origin),
        record_with_origin("acme", "b", &b_origin),
    ];

    // 1. First run clones both repositories into the layout.
    let report = run_sync(&catalog, &layout, &SyncOptions::sync_all());
    assert_eq!(report.counts.cloned, 2);
    assert_eq!(report.counts.failed, 0);
    assert!(layout.path_for(&catalog[0]).join(".git").is_dir());
    assert!(layout.path_for(&catalog[1]).join(".git").is_dir());

    // 2. Origin a moves ahead; b stays put with a fetch hint newer than its
    //    record's last push.
    commit_file(&a_origin, "feature.txt", "new work");
    catalog[0].pushed_at = Some(Utc::now());
    catalog[1].pushed_at = Some(days_ago(1));
    mark_fetched(&layout.path_for(&catalog[1]).to_native(), "main");

    let events = Mutex::new(Vec::new());
    let backend = GitBackend;
    let probe = GitProbe;
    let report = Orchestrator::new(&backend, &probe).with_workers(2).run(
        &catalog,
        &layout,
        &SyncOptions::sync_all(),
        |event| {
            events
                .lock()
                .unwrap()
                .push((event.repo.clone(), event.completed))
        },
    );

    // 3. Second run fast-forwards a, skips b, and reports both.
    assert_eq!(report.counts.updated, 1);
    assert_eq!(report.counts.skipped, 1);
    assert_eq!(report.counts.failed, 0);
    assert_eq!(report.results[1].skip_reason, Some(SkipReason::UpToDate));
    assert!(layout.path_for(&catalog[0]).join("feature.txt").exists());

    let events = events.into_inner().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events.last().unwrap().1, 2);
}

#[test]
fn test_one_bad_origin_does_not_stop_the_others() {
    let temp = TempDir::new().unwrap();
    let a_origin = temp.path().join("origins/a");
    let b_origin = temp.path().join("origins/b");
    origin_with_commit(&a_origin);
    origin_with_commit(&b_origin);

    let layout = MirrorLayout::new(temp.path().join("mirror"));
    let catalog = vec![
        record_with_origin("acme", "a", &a_origin),
        record_with_origin("acme", "gone", &temp.path().join("origins/gone")),
        record_with_origin("acme", "b", &b_origin),
    ];

    let report = run_sync(&catalog, &layout, &SyncOptions::sync_all());

    assert_eq!(report.counts.cloned, 2);
    assert_eq!(report.counts.failed, 1);
    let failed: Vec<&str> = report.failures().map(|r| r.repo.as_str()).collect();
    assert_eq!(failed, vec!["acme/gone"]);

    // The clones on either side of the failure landed on disk.
    assert!(layout.path_for(&catalog[0]).join("README.md").exists());
    assert!(layout.path_for(&catalog[2]).join("README.md").exists());
    assert!(!layout.path_for(&catalog[1]).exists());
}

#[test]
fn test_diverged_history_is_reported_not_destroyed() {
    let temp = TempDir::new().unwrap();
    let origin = temp.path().join("origin");
    origin_with_commit(&origin);

    let layout = MirrorLayout::new(temp.path().join("mirror"));
    let mut catalog = vec![record_with_origin("acme", "hot", &origin)];

    let report = run_sync(&catalog, &layout, &SyncOptions::sync_all());
    assert_eq!(report.counts.cloned, 1);

    // Someone committed into the mirror while the origin also moved.
    let local = layout.path_for(&catalog[0]).to_native();
    commit_file(&origin, "upstream.txt", "theirs");
    let local_tip = commit_file(&local, "local.txt", "ours");
    catalog[0].pushed_at = Some(Utc::now());

    let report = run_sync(&catalog, &layout, &SyncOptions::sync_all());

    assert_eq!(report.counts.failed, 1);
    let failure = report.failures().next().unwrap();
    assert_eq!(failure.error_kind, Some(FailureKind::DivergedHistory));
    assert!(!failure.retried);

    // The refusal left local history and the work tree alone.
    assert_eq!(tip_of(&local), local_tip);
    assert!(local.join("local.txt").exists());
}

#[test]
fn test_repair_is_opt_in_and_recreates_broken_clone() {
    let temp = TempDir::new().unwrap();
    let origin = temp.path().join("origin");
    origin_with_commit(&origin);

    let layout = MirrorLayout::new(temp.path().join("mirror"));
    let catalog = vec![record_with_origin("acme", "hurt", &origin)];

    let local = layout.path_for(&catalog[0]).to_native();
    fs::create_dir_all(&local).unwrap();
    corrupt_git_dir(&local);

    // Without repair the broken clone is flagged and left in place.
    let report = run_sync(&catalog, &layout, &SyncOptions::sync_all());
    assert_eq!(report.counts.warnings, 1);
    assert_eq!(report.counts.failed, 0);
    assert_eq!(
        report.results[0].skip_reason,
        Some(SkipReason::BrokenNoRepair)
    );
    assert_eq!(
        fs::read_to_string(local.join(".git/HEAD")).unwrap(),
        "not a ref\n"
    );

    // With repair it is removed and cloned fresh.
    let report = run_sync(&catalog, &layout, &SyncOptions::sync_all().with_repair());
    assert_eq!(report.counts.repaired, 1);
    assert_eq!(report.counts.failed, 0);

    let repo = Repository::open(&local).unwrap();
    assert_eq!(repo.head().unwrap().shorthand(), Some("main"));
    assert!(local.join("README.md").exists());
}

#[test]
fn test_report_accounts_for_every_record() {
    let temp = TempDir::new().unwrap();
    let fresh_origin = temp.path().join("origins/fresh");
    let new_origin = temp.path().join("origins/newcomer");
    origin_with_commit(&fresh_origin);
    origin_with_commit(&new_origin);

    let layout = MirrorLayout::new(temp.path().join("mirror"));
    let mut fresh = record_with_origin("acme", "fresh", &fresh_origin);
    fresh.pushed_at = Some(days_ago(1));
    let catalog = vec![
        fresh,
        record_with_origin("acme", "newcomer", &new_origin),
        record("acme", "no-urls"),
        record_with_origin("acme", "hurt", &temp.path().join("origins/gone")),
    ];

    // Seed the up-to-date clone and the broken directory by hand.
    let fresh_path = layout.path_for(&catalog[0]).to_native();
    clone_local(&fresh_origin, &fresh_path);
    mark_fetched(&fresh_path, "main");
    let hurt_path = layout.path_for(&catalog[3]).to_native();
    fs::create_dir_all(&hurt_path).unwrap();
    corrupt_git_dir(&hurt_path);

    let report = run_sync(&catalog, &layout, &SyncOptions::sync_all());

    assert_eq!(report.counts.total, 4);
    assert_eq!(report.counts.cloned, 1);
    assert_eq!(report.counts.skipped, 3);
    assert_eq!(report.counts.warnings, 1);
    assert_eq!(report.counts.planning_errors, 1);
    assert_eq!(report.counts.failed, 0);

    let repos: Vec<&str> = report.results.iter().map(|r| r.repo.as_str()).collect();
    assert_eq!(
        repos,
        vec!["acme/fresh", "acme/newcomer", "acme/no-urls", "acme/hurt"]
    );
    assert_eq!(report.results[0].skip_reason, Some(SkipReason::UpToDate));
    assert_eq!(
        report.results[2].skip_reason,
        Some(SkipReason::MalformedRecord)
    );
    assert_eq!(
        report.results[3].skip_reason,
        Some(SkipReason::BrokenNoRepair)
    );
    assert!(!report.is_clean());
}

#[test]
fn test_run_log_round_trips_through_logs_dir() {
    let temp = TempDir::new().unwrap();
    let origin = temp.path().join("origin");
    origin_with_commit(&origin);

    let layout = MirrorLayout::new(temp.path().join("mirror"));
    let catalog = vec![record_with_origin("acme", "logged", &origin)];

    let options = SyncOptions::sync_all();
    let report = run_sync(&catalog, &layout, &options);
    assert_eq!(report.counts.cloned, 1);

    let written = RunLogWriter::new(layout.logs_dir())
        .write(&RunLog::new("sync", options, report.clone()))
        .unwrap();

    assert!(written.as_str().contains("/.mirror/logs/"));
    let loaded: RunLog = mirror_fs::read_json(&written).unwrap();
    assert_eq!(loaded.operation, "sync");
    assert_eq!(loaded.report.counts, report.counts);
    assert_eq!(loaded.report.results.len(), 1);
}

#[test]
fn test_update_follows_renamed_default_branch() {
    let temp = TempDir::new().unwrap();
    let origin = temp.path().join("origin");
    origin_with_commit(&origin);

    let layout = MirrorLayout::new(temp.path().join("mirror"));
    let mut catalog = vec![record_with_origin("acme", "renamed", &origin)];

    let report = run_sync(&catalog, &layout, &SyncOptions::sync_all());
    assert_eq!(report.counts.cloned, 1);

    // The remote renames its default branch; the catalog follows.
    let origin_repo = Repository::open(&origin).unwrap();
    let mut main = origin_repo.find_branch("main", BranchType::Local).unwrap();
    main.rename("trunk", false).unwrap();
    origin_repo.set_head("refs/heads/trunk").unwrap();
    catalog[0].default_branch = "trunk".to_string();

    let report = run_sync(&catalog, &layout, &SyncOptions::sync_all());

    assert_eq!(report.counts.updated, 1);
    assert_eq!(report.counts.failed, 0);
    let local = Repository::open(layout.path_for(&catalog[0]).to_native()).unwrap();
    assert_eq!(local.head().unwrap().shorthand(), Some("trunk"));
}
