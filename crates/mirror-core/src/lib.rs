//! Sync engine for Mirror Manager
//!
//! This crate turns a remote catalog plus the on-disk mirror tree into a
//! finished batch run:
//!
//! - **Planning**: one deterministic action per catalog record, driven by
//!   probed local state and the run options
//! - **Execution**: clone, fast-forward update, and repair through a git
//!   backend, with a single retry for transient failures
//! - **Orchestration**: a bounded worker pool with progress reporting,
//!   cooperative cancellation, and per-repository failure isolation
//! - **Reporting**: catalog-ordered results, derived tallies, and JSON run
//!   logs for auditing
//!
//! # Architecture
//!
//! `mirror-core` sits above the leaf crates and below the CLI:
//!
//! ```text
//!              CLI
//!               |
//!          mirror-core
//!               |
//!     +---------+---------+
//!     |         |         |
//! mirror-fs mirror-git mirror-remote
//! ```
//!
//! # Example
//!
//! ```ignore
//! use mirror_core::{Orchestrator, SyncOptions};
//! use mirror_git::{GitBackend, GitProbe};
//!
//! let backend = GitBackend::default();
//! let probe = GitProbe::default();
//! let report = Orchestrator::new(&backend, &probe)
//!     .run(&catalog, &layout, &SyncOptions::sync_all(), |event| {
//!         println!("[{}/{}] {}", event.completed, event.total, event.repo);
//!     });
//! ```

pub mod error;
pub mod execute;
pub mod logsink;
pub mod orchestrate;
pub mod plan;
pub mod progress;
pub mod report;
pub mod status;

pub use error::{Error, Result};
pub use execute::{DEFAULT_RETRY_PAUSE, DEFAULT_TIMEOUT, Executor};
pub use logsink::{RunLog, RunLogWriter};
pub use orchestrate::{Orchestrator, default_workers};
pub use plan::{SyncAction, SyncOptions, plan};
pub use progress::{CancelFlag, ProgressEvent};
pub use report::{ActionKind, BatchCounts, BatchReport, SkipReason, SyncResult};
pub use status::{RepoStatus, StatusReport, scan};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_wraps_leaf_crate_failures() {
        let leaf = mirror_remote::Error::malformed("acme/a", "no clone url");
        let error = Error::from(leaf);

        let display = format!("{}", error);
        assert!(
            display.contains("acme/a"),
            "Error display should carry the repository name, got: {}",
            display
        );
    }
}
