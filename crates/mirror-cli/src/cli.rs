//! CLI argument parsing using clap derive

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Mirror Manager - Keep local mirrors of remote git repositories in sync
#[derive(Parser, Debug)]
#[command(name = "mirror")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Mirror root directory (overrides the config file)
    #[arg(long, global = true, env = "MIRROR_ROOT")]
    pub root: Option<PathBuf>,

    /// Catalog file with remote repository records
    #[arg(long, global = true, env = "MIRROR_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Config file location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Synchronize the mirror tree with the catalog
    ///
    /// Clones missing repositories and fast-forwards existing ones by
    /// default. Repair is opt-in because it removes the damaged clone
    /// before cloning again.
    ///
    /// Examples:
    ///   mirror sync                      # Clone missing, update existing
    ///   mirror sync --no-clone           # Only update what exists
    ///   mirror sync --repair --yes       # Also re-clone broken mirrors
    ///   mirror sync --repo acme/widgets  # Only the named repository
    Sync {
        /// Limit the run to the named repositories (owner/name, repeatable)
        #[arg(long = "repo")]
        repos: Vec<String>,

        /// Do not clone repositories that are missing locally
        #[arg(long)]
        no_clone: bool,

        /// Do not update repositories that already exist
        #[arg(long)]
        no_update: bool,

        /// Remove and re-clone repositories with damaged work trees
        #[arg(long)]
        repair: bool,

        /// Answer yes to the repair confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Worker threads (defaults to one per core, between 4 and 8)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Per-operation timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Preferred clone transport (ssh or https)
        #[arg(long)]
        transport: Option<String>,

        /// Do not write a JSON run log
        #[arg(long)]
        no_log: bool,
    },

    /// Show what sync would do without touching anything
    Plan {
        /// Limit the plan to the named repositories (owner/name, repeatable)
        #[arg(long = "repo")]
        repos: Vec<String>,

        /// Plan as if cloning were disabled
        #[arg(long)]
        no_clone: bool,

        /// Plan as if updates were disabled
        #[arg(long)]
        no_update: bool,

        /// Plan with repair enabled
        #[arg(long)]
        repair: bool,
    },

    /// Inspect local state and integrity of every mirrored repository
    Status,

    /// List catalog records with a per-language summary
    List {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}
