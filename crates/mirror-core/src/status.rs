//! Read-only inspection of the mirror tree against a catalog.

use crate::error::Result;
use mirror_fs::NormalizedPath;
use mirror_git::{HealthStatus, LocalState, StateProbe, check_health};
use mirror_remote::{MirrorLayout, RemoteRepo};

/// Sync state and integrity of one catalog entry's local clone.
#[derive(Debug, Clone)]
pub struct RepoStatus {
    /// Repository identifier in `owner/name` form.
    pub repo: String,
    pub path: NormalizedPath,
    pub state: LocalState,
    /// Integrity verdict for clones that exist on disk.
    pub health: Option<HealthStatus>,
}

/// Snapshot of the whole mirror tree. Produced without network access.
#[derive(Debug, Clone)]
pub struct StatusReport {
    /// One entry per catalog record, in catalog order.
    pub repos: Vec<RepoStatus>,
    /// Directories in the tree that no catalog record claims.
    pub orphans: Vec<NormalizedPath>,
}

/// Probe every record's local state and scan for orphan directories.
pub fn scan(
    catalog: &[RemoteRepo],
    layout: &MirrorLayout,
    probe: &dyn StateProbe,
) -> Result<StatusReport> {
    let mut repos = Vec::with_capacity(catalog.len());
    for record in catalog {
        let path = layout.path_for(record);
        let state = probe.probe(&path.to_native(), &record.default_branch);
        let health = match &state {
            LocalState::Absent => None,
            _ => Some(check_health(&path.to_native())),
        };
        repos.push(RepoStatus {
            repo: record.full_name(),
            path,
            state,
            health,
        });
    }
    let orphans = layout.orphans(catalog)?;
    Ok(StatusReport { repos, orphans })
}
