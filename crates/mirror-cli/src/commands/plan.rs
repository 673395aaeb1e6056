//! Plan command implementation
//!
//! Prints what a sync run would do without executing anything.

use colored::Colorize;

use mirror_core::{SyncAction, SyncOptions, plan};
use mirror_git::GitProbe;
use mirror_remote::MirrorLayout;

use crate::commands::sync::{load_catalog, select_records};
use crate::config::Settings;
use crate::error::Result;

pub fn run_plan(settings: &Settings, repos: &[String], options: SyncOptions) -> Result<()> {
    let records = select_records(load_catalog(settings)?, repos)?;
    let layout = MirrorLayout::new(settings.root.clone());
    let probe = GitProbe::default();

    let actions = plan(&records, &layout, &probe, &options);

    println!(
        "{} Plan for {} repositories under {}",
        "=>".blue().bold(),
        actions.len(),
        settings.root
    );
    for action in &actions {
        match action {
            SyncAction::Skip { repo, reason } => {
                println!(
                    "   {} {} ({})",
                    "skip".dimmed(),
                    repo.full_name(),
                    reason.to_string().dimmed()
                );
            }
            SyncAction::Clone { repo, path } => {
                println!(
                    "   {} {} -> {}",
                    "clone".green().bold(),
                    repo.full_name().cyan(),
                    path
                );
            }
            SyncAction::Update { repo, .. } => {
                println!("   {} {}", "update".blue().bold(), repo.full_name().cyan());
            }
            SyncAction::Repair { repo, path } => {
                println!(
                    "   {} {} (removes {})",
                    "repair".red().bold(),
                    repo.full_name().cyan(),
                    path
                );
            }
        }
    }

    let to_run = actions.iter().filter(|a| !a.is_skip()).count();
    println!();
    println!(
        "{} {} of {} actions would run",
        "=>".blue().bold(),
        to_run,
        actions.len()
    );
    Ok(())
}
