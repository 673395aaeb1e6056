//! Sync command implementation
//!
//! Loads the catalog, runs the orchestrator against the mirror root, prints
//! per-action progress, and persists a JSON run log.

use colored::Colorize;
use dialoguer::Confirm;

use mirror_core::{
    ActionKind, BatchReport, Orchestrator, ProgressEvent, RunLog, RunLogWriter, SyncOptions,
};
use mirror_git::{GitBackend, GitProbe};
use mirror_remote::{CatalogSource, JsonCatalog, MirrorLayout, RemoteRepo};

use crate::config::Settings;
use crate::error::{CliError, Result};

/// Load every record from the configured catalog file.
pub fn load_catalog(settings: &Settings) -> Result<Vec<RemoteRepo>> {
    let catalog = JsonCatalog::new(settings.catalog.clone());
    Ok(catalog.fetch("")?)
}

/// Narrow the catalog to the `--repo` selections, keeping flag order.
/// Names match case-insensitively; unknown names abort with a list.
pub fn select_records(catalog: Vec<RemoteRepo>, names: &[String]) -> Result<Vec<RemoteRepo>> {
    if names.is_empty() {
        return Ok(catalog);
    }

    let mut selected = Vec::with_capacity(names.len());
    let mut unknown = Vec::new();
    for name in names {
        match catalog
            .iter()
            .find(|r| r.full_name().eq_ignore_ascii_case(name))
        {
            Some(record) => selected.push(record.clone()),
            None => unknown.push(name.as_str()),
        }
    }
    if !unknown.is_empty() {
        return Err(CliError::user(format!(
            "not in the catalog: {}",
            unknown.join(", ")
        )));
    }
    Ok(selected)
}

/// Run the sync command. Returns the process exit code: 0 for a clean run,
/// 2 when some operations failed.
pub fn run_sync(
    settings: &Settings,
    repos: &[String],
    options: SyncOptions,
    assume_yes: bool,
    write_log: bool,
) -> Result<i32> {
    if options.repair_broken && !assume_yes && !confirm_repair()? {
        println!("Aborted.");
        return Ok(0);
    }

    let records = select_records(load_catalog(settings)?, repos)?;
    if records.is_empty() {
        println!("{} Catalog is empty, nothing to sync.", "=>".blue().bold());
        return Ok(0);
    }

    println!(
        "{} Syncing {} repositories into {} ({} workers)",
        "=>".blue().bold(),
        records.len(),
        settings.root,
        settings.workers
    );

    let layout = MirrorLayout::new(settings.root.clone());
    let backend = GitBackend::default();
    let probe = GitProbe::default();
    let orchestrator = Orchestrator::new(&backend, &probe)
        .with_workers(settings.workers)
        .with_timeout(settings.timeout)
        .with_transport(settings.transport);

    let report = orchestrator.run(&records, &layout, &options, print_progress);
    print_summary(&report);

    if write_log {
        let writer = RunLogWriter::new(layout.logs_dir());
        let log = RunLog::new("sync", options, report.clone());
        match writer.write(&log) {
            Ok(path) => println!("   run log: {}", path.to_string().dimmed()),
            Err(e) => eprintln!(
                "{}: could not write run log: {}",
                "warning".yellow().bold(),
                e
            ),
        }
    }

    Ok(if report.has_failures() { 2 } else { 0 })
}

fn confirm_repair() -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt("Repair removes damaged clones and clones them again. Continue?")
        .default(false)
        .interact()?;
    Ok(confirmed)
}

fn print_progress(event: &ProgressEvent) {
    let position = format!("[{}/{}]", event.completed, event.total);
    match event.action {
        ActionKind::Skip => {
            let reason = event
                .skip_reason
                .map(|r| r.to_string())
                .unwrap_or_default();
            println!(
                "{} {} {} ({})",
                position.dimmed(),
                "skip".dimmed(),
                event.repo,
                reason.dimmed()
            );
        }
        action if event.success => {
            println!(
                "{} {} {}",
                position.blue().bold(),
                action.to_string().green(),
                event.repo
            );
        }
        action => {
            println!(
                "{} {} {} {}: {}",
                position.blue().bold(),
                "FAIL".red().bold(),
                action,
                event.repo,
                event.error.as_deref().unwrap_or("unknown failure")
            );
        }
    }
}

fn print_summary(report: &BatchReport) {
    let counts = &report.counts;
    println!();
    println!(
        "{} Done in {:.1}s: {} cloned, {} updated, {} repaired, {} skipped, {} failed",
        "=>".blue().bold(),
        report.duration_ms as f64 / 1000.0,
        counts.cloned,
        counts.updated,
        counts.repaired,
        counts.skipped,
        counts.failed
    );
    if counts.warnings > 0 {
        println!(
            "   {} {} broken clone(s) left in place; run {} to re-clone them",
            "!".yellow().bold(),
            counts.warnings,
            "mirror sync --repair".cyan()
        );
    }
    if counts.planning_errors > 0 {
        println!(
            "   {} {} record(s) could not be planned; see the run log",
            "!".red().bold(),
            counts.planning_errors
        );
    }
    for failure in report.failures() {
        println!(
            "   {} {} ({}): {}",
            "!".red(),
            failure.repo.cyan(),
            failure.action,
            failure.error.as_deref().unwrap_or("unknown failure")
        );
    }
}
