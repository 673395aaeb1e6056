//! Status command implementation
//!
//! Probes every catalog record's local clone and reports integrity without
//! touching the network.

use colored::Colorize;

use mirror_core::scan;
use mirror_git::{GitProbe, LocalState};
use mirror_remote::MirrorLayout;

use crate::commands::sync::load_catalog;
use crate::config::Settings;
use crate::error::Result;

pub fn run_status(settings: &Settings) -> Result<()> {
    let records = load_catalog(settings)?;
    let layout = MirrorLayout::new(settings.root.clone());
    let probe = GitProbe::default();

    let report = scan(&records, &layout, &probe)?;

    println!(
        "{} {} repositories under {}",
        "=>".blue().bold(),
        report.repos.len(),
        settings.root
    );

    let mut absent = 0usize;
    let mut broken = 0usize;
    for entry in &report.repos {
        match &entry.state {
            LocalState::Present { .. } => {
                match entry.health.as_ref().filter(|h| !h.is_healthy()) {
                    Some(health) => println!(
                        "   {} {} ({})",
                        "present".green(),
                        entry.repo.cyan(),
                        health.to_string().yellow()
                    ),
                    None => println!("   {} {}", "present".green(), entry.repo.cyan()),
                }
            }
            LocalState::Stale { reason } => {
                println!(
                    "   {} {} ({})",
                    "stale".yellow(),
                    entry.repo.cyan(),
                    reason
                );
            }
            LocalState::Absent => {
                absent += 1;
                println!("   {} {}", "absent".dimmed(), entry.repo.as_str().dimmed());
            }
            LocalState::Broken { reason } => {
                broken += 1;
                println!(
                    "   {} {} ({})",
                    "broken".red().bold(),
                    entry.repo.cyan(),
                    reason
                );
            }
            LocalState::Unknown { error } => {
                broken += 1;
                println!(
                    "   {} {} ({})",
                    "unknown".red().bold(),
                    entry.repo.cyan(),
                    error
                );
            }
        }
    }

    println!();
    if absent > 0 {
        println!(
            "   {} missing; run {} to clone",
            absent,
            "mirror sync".cyan()
        );
    }
    if broken > 0 {
        println!(
            "   {} broken; run {} to re-clone",
            broken,
            "mirror sync --repair".cyan()
        );
    }
    if !report.orphans.is_empty() {
        println!(
            "{} {} directories not claimed by any catalog record:",
            "!".yellow().bold(),
            report.orphans.len()
        );
        for orphan in &report.orphans {
            println!("   {}", orphan.to_string().dimmed());
        }
    }

    Ok(())
}
