//! Standalone integrity check for local working copies
//!
//! Complements the probe: the probe decides what a sync run should do, the
//! health check tells a user what condition a mirror is in. A `Corrupt`
//! verdict is the cue to re-run sync with repair enabled for that
//! repository.

use std::fs;
use std::path::Path;

use git2::Repository;

use crate::probe::tracking_tip;

/// Condition of one local working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Corrupt { reason: String },
    /// Local commits the remote does not have. Not an error for updates,
    /// but unexpected for a mirror, so it is surfaced.
    AheadOfRemote { ahead: usize },
    DetachedHead,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Corrupt { reason } => write!(f, "corrupt: {reason}"),
            HealthStatus::AheadOfRemote { ahead } => {
                write!(f, "ahead of remote by {ahead} commit(s)")
            }
            HealthStatus::DetachedHead => write!(f, "detached HEAD"),
        }
    }
}

/// Check the repository at `local_path`.
pub fn check_health(local_path: &Path) -> HealthStatus {
    match fs::metadata(local_path) {
        Err(e) => {
            return HealthStatus::Corrupt {
                reason: format!("cannot stat path: {e}"),
            };
        }
        Ok(meta) if !meta.is_dir() => {
            return HealthStatus::Corrupt {
                reason: "path exists but is not a directory".to_string(),
            };
        }
        Ok(_) => {}
    }

    let repo = match Repository::open(local_path) {
        Ok(repo) => repo,
        Err(e) => {
            return HealthStatus::Corrupt {
                reason: e.message().to_string(),
            };
        }
    };

    if repo.head_detached().unwrap_or(false) {
        return HealthStatus::DetachedHead;
    }

    let head = match repo.head() {
        Ok(head) => head,
        Err(e) => {
            return HealthStatus::Corrupt {
                reason: format!("unreadable HEAD: {}", e.message()),
            };
        }
    };
    let local_tip = match head.peel_to_commit() {
        Ok(commit) => commit.id(),
        Err(e) => {
            return HealthStatus::Corrupt {
                reason: format!("HEAD does not resolve to a commit: {}", e.message()),
            };
        }
    };

    let branch = head.shorthand().unwrap_or("HEAD").to_string();
    let Some(remote_tip) = tracking_tip(&repo, &branch) else {
        // Nothing to compare against; staleness is the probe's concern.
        return HealthStatus::Healthy;
    };

    match repo.graph_ahead_behind(local_tip, remote_tip) {
        Ok((ahead, _)) if ahead > 0 => HealthStatus::AheadOfRemote { ahead },
        Ok(_) => HealthStatus::Healthy,
        Err(e) => HealthStatus::Corrupt {
            reason: format!("history walk failed: {}", e.message()),
        },
    }
}
