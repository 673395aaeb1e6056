//! List command implementation
//!
//! Prints the catalog with aggregate statistics, or raw JSON for scripting.

use colored::Colorize;
use serde::Serialize;

use mirror_remote::{CatalogSummary, RemoteRepo};

use crate::commands::sync::load_catalog;
use crate::config::Settings;
use crate::error::{CliError, Result};

#[derive(Serialize)]
struct ListOutput<'a> {
    repositories: &'a [RemoteRepo],
    summary: &'a CatalogSummary,
}

pub fn run_list(settings: &Settings, json: bool) -> Result<()> {
    let records = load_catalog(settings)?;
    let summary = CatalogSummary::from_records(&records);

    if json {
        let output = ListOutput {
            repositories: &records,
            summary: &summary,
        };
        let body = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::user(format!("could not serialize catalog: {e}")))?;
        println!("{body}");
        return Ok(());
    }

    println!(
        "{} {} repositories in {}",
        "=>".blue().bold(),
        records.len(),
        settings.catalog
    );
    for record in &records {
        let mut markers = Vec::new();
        if record.private {
            markers.push("private");
        }
        if record.fork {
            markers.push("fork");
        }
        if record.archived {
            markers.push("archived");
        }
        let suffix = if markers.is_empty() {
            String::new()
        } else {
            format!(" [{}]", markers.join(", "))
        };
        match &record.language {
            Some(language) => println!(
                "   {} {}{}",
                record.full_name().cyan(),
                language.dimmed(),
                suffix.dimmed()
            ),
            None => println!("   {}{}", record.full_name().cyan(), suffix.dimmed()),
        }
    }

    println!();
    println!(
        "{} {} total, {} private, {} forks, {} archived, ~{} MB",
        "=>".blue().bold(),
        summary.total,
        summary.private,
        summary.forks,
        summary.archived,
        summary.total_size_kb / 1024
    );
    let top: Vec<String> = summary
        .languages_by_count()
        .iter()
        .take(5)
        .map(|(language, count)| format!("{language} ({count})"))
        .collect();
    if !top.is_empty() {
        println!("   languages: {}", top.join(", "));
    }

    Ok(())
}
