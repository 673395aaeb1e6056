//! Mirror Manager CLI
//!
//! The command-line interface for keeping local mirrors of remote git
//! repositories in sync.

mod cli;
mod commands;
mod config;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Commands};
use config::Settings;
use error::Result;
use mirror_core::SyncOptions;

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    // Setup tracing if verbose
    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .finish();
        if tracing::subscriber::set_global_default(subscriber).is_ok() {
            tracing::debug!("Verbose mode enabled");
        }
    }

    let Some(command) = cli.command else {
        // No command provided - show help hint
        println!("{} Mirror Manager CLI", "mirror".green().bold());
        println!();
        println!("Run {} for available commands.", "mirror --help".cyan());
        return Ok(0);
    };

    let resolve = |jobs, timeout, transport: Option<&str>| -> Result<Settings> {
        Settings::resolve(
            cli.config.as_deref(),
            cli.root.as_deref(),
            cli.catalog.as_deref(),
            jobs,
            timeout,
            transport,
        )
    };

    match command {
        Commands::Sync {
            repos,
            no_clone,
            no_update,
            repair,
            yes,
            jobs,
            timeout,
            transport,
            no_log,
        } => {
            let settings = resolve(jobs, timeout, transport.as_deref())?;
            let options = SyncOptions {
                clone_missing: !no_clone,
                update_existing: !no_update,
                repair_broken: repair,
            };
            commands::run_sync(&settings, &repos, options, yes, !no_log)
        }
        Commands::Plan {
            repos,
            no_clone,
            no_update,
            repair,
        } => {
            let settings = resolve(None, None, None)?;
            let options = SyncOptions {
                clone_missing: !no_clone,
                update_existing: !no_update,
                repair_broken: repair,
            };
            commands::run_plan(&settings, &repos, options)?;
            Ok(0)
        }
        Commands::Status => {
            let settings = resolve(None, None, None)?;
            commands::run_status(&settings)?;
            Ok(0)
        }
        Commands::List { json } => {
            let settings = resolve(None, None, None)?;
            commands::run_list(&settings, json)?;
            Ok(0)
        }
    }
}
