//! Local repository state probe
//!
//! Classifies one local mirror path. The probe only reads: every corrective
//! action, including repair of broken metadata, belongs to the backend. It
//! never propagates errors past its boundary; anything unexpected becomes
//! [`LocalState::Unknown`].

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use git2::{BranchType, Oid, Repository};

/// Why a valid working copy still needs an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// Local tip is strictly behind the remote-tracking tip.
    Behind,
    /// Local and remote-tracking tips have diverged. The update attempt
    /// will fail fast-forward analysis and report it, without touching
    /// local history.
    Diverged,
    /// No remote-tracking ref to compare against; update conservatively.
    NoTrackingRef,
    /// The checkout is not on the catalog's default branch (renamed on the
    /// remote, or drifted locally).
    DefaultBranchChanged,
}

impl std::fmt::Display for StaleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            StaleReason::Behind => "behind remote",
            StaleReason::Diverged => "diverged from remote",
            StaleReason::NoTrackingRef => "no remote tracking ref",
            StaleReason::DefaultBranchChanged => "default branch changed",
        };
        write!(f, "{label}")
    }
}

/// Classification of one local mirror path.
///
/// Recomputed fresh each run; `fetched_at` is a hint read from the
/// repository's FETCH_HEAD mtime, never a correctness source.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalState {
    Absent,
    Present { fetched_at: Option<DateTime<Utc>> },
    Stale { reason: StaleReason },
    Broken { reason: String },
    Unknown { error: String },
}

impl LocalState {
    pub fn label(&self) -> &'static str {
        match self {
            LocalState::Absent => "absent",
            LocalState::Present { .. } => "present",
            LocalState::Stale { .. } => "stale",
            LocalState::Broken { .. } => "broken",
            LocalState::Unknown { .. } => "unknown",
        }
    }
}

/// Probes local paths against the catalog's expected default branch.
pub trait StateProbe: Send + Sync {
    fn probe(&self, path: &Path, default_branch: &str) -> LocalState;
}

/// git2-backed probe.
#[derive(Debug, Default)]
pub struct GitProbe;

impl StateProbe for GitProbe {
    fn probe(&self, path: &Path, default_branch: &str) -> LocalState {
        match fs::metadata(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => return LocalState::Absent,
            Err(e) => {
                return LocalState::Unknown {
                    error: format!("cannot stat {}: {e}", path.display()),
                };
            }
            Ok(meta) if !meta.is_dir() => {
                return LocalState::Broken {
                    reason: "path exists but is not a directory".to_string(),
                };
            }
            Ok(_) => {}
        }

        let repo = match Repository::open(path) {
            Ok(repo) => repo,
            Err(e) => {
                return LocalState::Broken {
                    reason: format!("not a usable repository: {}", e.message()),
                };
            }
        };

        classify_work_tree(&repo, default_branch)
    }
}

fn classify_work_tree(repo: &Repository, default_branch: &str) -> LocalState {
    if repo.head_detached().unwrap_or(false) {
        return LocalState::Broken {
            reason: "detached HEAD".to_string(),
        };
    }

    let head = match repo.head() {
        Ok(head) => head,
        Err(e) => {
            return LocalState::Broken {
                reason: format!("unreadable HEAD: {}", e.message()),
            };
        }
    };
    let local_tip = match head.peel_to_commit() {
        Ok(commit) => commit.id(),
        Err(e) => {
            return LocalState::Broken {
                reason: format!("HEAD does not resolve to a commit: {}", e.message()),
            };
        }
    };

    if head.shorthand() != Some(default_branch) {
        return LocalState::Stale {
            reason: StaleReason::DefaultBranchChanged,
        };
    }

    let Some(remote_tip) = tracking_tip(repo, default_branch) else {
        return LocalState::Stale {
            reason: StaleReason::NoTrackingRef,
        };
    };

    if remote_tip == local_tip {
        return LocalState::Present {
            fetched_at: fetched_at_hint(repo),
        };
    }

    match repo.graph_ahead_behind(local_tip, remote_tip) {
        // Ahead only: a healthy working copy as far as updates go. The
        // health check is what flags unexpected local commits.
        Ok((_, 0)) => LocalState::Present {
            fetched_at: fetched_at_hint(repo),
        },
        Ok((0, _)) => LocalState::Stale {
            reason: StaleReason::Behind,
        },
        Ok(_) => LocalState::Stale {
            reason: StaleReason::Diverged,
        },
        Err(e) => LocalState::Broken {
            reason: format!("history walk failed: {}", e.message()),
        },
    }
}

/// Remote-tracking tip for `branch`: the configured upstream when present,
/// `refs/remotes/origin/<branch>` otherwise.
pub(crate) fn tracking_tip(repo: &Repository, branch: &str) -> Option<Oid> {
    if let Ok(local) = repo.find_branch(branch, BranchType::Local)
        && let Ok(upstream) = local.upstream()
        && let Some(oid) = upstream.get().target()
    {
        return Some(oid);
    }
    repo.find_reference(&format!("refs/remotes/origin/{branch}"))
        .ok()?
        .target()
}

fn fetched_at_hint(repo: &Repository) -> Option<DateTime<Utc>> {
    let meta = fs::metadata(repo.path().join("FETCH_HEAD")).ok()?;
    let modified = meta.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}
