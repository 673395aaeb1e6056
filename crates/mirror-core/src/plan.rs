//! Decides what to do with each catalog record.
//!
//! Planning is a pure function of the catalog, the probed local state, and
//! the run options. It performs no git or network work itself, which keeps
//! the decision table testable without fixtures.

use crate::report::{ActionKind, SkipReason};
use mirror_fs::NormalizedPath;
use mirror_git::{LocalState, StateProbe};
use mirror_remote::{MirrorLayout, RemoteRepo};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Which operations a run is allowed to perform.
///
/// The historical sync modes collapse into three independent switches. The
/// named constructors cover the common combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Clone repositories that do not exist locally.
    pub clone_missing: bool,
    /// Fast-forward repositories whose remote has moved.
    pub update_existing: bool,
    /// Remove and re-clone repositories with damaged work trees.
    pub repair_broken: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::sync_all()
    }
}

impl SyncOptions {
    /// Clone what is missing and update what exists. Repair stays opt-in
    /// because it discards the damaged work tree.
    pub fn sync_all() -> Self {
        Self {
            clone_missing: true,
            update_existing: true,
            repair_broken: false,
        }
    }

    /// Only clone repositories that are missing locally.
    pub fn clone_only() -> Self {
        Self {
            clone_missing: true,
            update_existing: false,
            repair_broken: false,
        }
    }

    /// Only update repositories that already exist.
    pub fn update_only() -> Self {
        Self {
            clone_missing: false,
            update_existing: true,
            repair_broken: false,
        }
    }

    /// Enable repair on top of the current options.
    pub fn with_repair(mut self) -> Self {
        self.repair_broken = true;
        self
    }
}

/// One planned step for one repository.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncAction {
    /// Nothing to execute; the reason is recorded in the report.
    Skip { repo: RemoteRepo, reason: SkipReason },
    /// Clone into `path`, which does not exist yet.
    Clone {
        repo: RemoteRepo,
        path: NormalizedPath,
    },
    /// Fetch and fast-forward the clone at `path`.
    Update {
        repo: RemoteRepo,
        path: NormalizedPath,
    },
    /// Remove the damaged clone at `path` and clone again.
    Repair {
        repo: RemoteRepo,
        path: NormalizedPath,
    },
}

impl SyncAction {
    pub fn repo(&self) -> &RemoteRepo {
        match self {
            SyncAction::Skip { repo, .. }
            | SyncAction::Clone { repo, .. }
            | SyncAction::Update { repo, .. }
            | SyncAction::Repair { repo, .. } => repo,
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            SyncAction::Skip { .. } => ActionKind::Skip,
            SyncAction::Clone { .. } => ActionKind::Clone,
            SyncAction::Update { .. } => ActionKind::Update,
            SyncAction::Repair { .. } => ActionKind::Repair,
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, SyncAction::Skip { .. })
    }
}

/// Map every catalog record to exactly one action, in catalog order.
///
/// The same catalog, probe results, and options always produce the same
/// plan. Records without a clone URL become [`SkipReason::MalformedRecord`]
/// skips rather than aborting the batch.
pub fn plan(
    catalog: &[RemoteRepo],
    layout: &MirrorLayout,
    probe: &dyn StateProbe,
    options: &SyncOptions,
) -> Vec<SyncAction> {
    catalog
        .iter()
        .map(|repo| plan_one(repo, layout, probe, options))
        .collect()
}

fn plan_one(
    repo: &RemoteRepo,
    layout: &MirrorLayout,
    probe: &dyn StateProbe,
    options: &SyncOptions,
) -> SyncAction {
    let name = repo.full_name();
    if !repo.has_clone_url() {
        warn!(repo = %name, "catalog record has no clone url, skipping");
        return skip(repo, SkipReason::MalformedRecord);
    }

    let path = layout.path_for(repo);
    let state = probe.probe(&path.to_native(), &repo.default_branch);
    match state {
        LocalState::Absent => {
            if options.clone_missing {
                SyncAction::Clone {
                    repo: repo.clone(),
                    path,
                }
            } else {
                skip(repo, SkipReason::CloningDisabled)
            }
        }
        LocalState::Present { fetched_at } => {
            if !remote_newer(repo, fetched_at) {
                skip(repo, SkipReason::UpToDate)
            } else if options.update_existing {
                SyncAction::Update {
                    repo: repo.clone(),
                    path,
                }
            } else {
                skip(repo, SkipReason::UpdatesDisabled)
            }
        }
        LocalState::Stale { reason } => {
            if options.update_existing {
                tracing::debug!(repo = %name, reason = %reason, "clone is stale");
                SyncAction::Update {
                    repo: repo.clone(),
                    path,
                }
            } else {
                skip(repo, SkipReason::UpdatesDisabled)
            }
        }
        LocalState::Broken { reason } => {
            if options.repair_broken {
                SyncAction::Repair {
                    repo: repo.clone(),
                    path,
                }
            } else {
                warn!(repo = %name, reason = %reason, "broken clone left in place");
                skip(repo, SkipReason::BrokenNoRepair)
            }
        }
        LocalState::Unknown { error } => {
            warn!(repo = %name, error = %error, "could not determine local state");
            skip(repo, SkipReason::ProbeFailed)
        }
    }
}

fn skip(repo: &RemoteRepo, reason: SkipReason) -> SyncAction {
    SyncAction::Skip {
        repo: repo.clone(),
        reason,
    }
}

/// A clone is provably fresh only when both timestamps exist and the last
/// push is not newer than the last fetch. Any missing signal forces an
/// update attempt rather than a silent skip.
fn remote_newer(repo: &RemoteRepo, fetched_at: Option<chrono::DateTime<chrono::Utc>>) -> bool {
    match (repo.pushed_at, fetched_at) {
        (Some(pushed), Some(fetched)) => pushed > fetched,
        _ => true,
    }
}
