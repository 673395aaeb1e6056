//! Outcome types for sync runs.
//!
//! A batch run produces one [`SyncResult`] per catalog record and rolls them
//! up into a [`BatchReport`]. Both serialize to JSON so runs can be audited
//! after the fact.

use chrono::{DateTime, Utc};
use mirror_git::{FailureKind, TransferStats};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// What the planner decided to do with a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Skip,
    Clone,
    Update,
    Repair,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Skip => write!(f, "skip"),
            ActionKind::Clone => write!(f, "clone"),
            ActionKind::Update => write!(f, "update"),
            ActionKind::Repair => write!(f, "repair"),
        }
    }
}

/// Why the planner produced a skip instead of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Local clone matches the remote; nothing to transfer.
    UpToDate,
    /// The remote moved but updates were not requested.
    UpdatesDisabled,
    /// The repository is missing locally but cloning was not requested.
    CloningDisabled,
    /// The work tree is damaged and repair was not requested.
    BrokenNoRepair,
    /// The local state could not be determined.
    ProbeFailed,
    /// The catalog record carries no usable clone URL.
    MalformedRecord,
    /// The run was cancelled before this action was dispatched.
    Cancelled,
}

impl SkipReason {
    /// Skips that deserve operator attention but are not failures.
    pub fn is_warning(&self) -> bool {
        matches!(self, SkipReason::BrokenNoRepair)
    }

    /// Skips caused by bad input or an unreadable work tree.
    pub fn is_error(&self) -> bool {
        matches!(self, SkipReason::ProbeFailed | SkipReason::MalformedRecord)
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UpToDate => write!(f, "up to date"),
            SkipReason::UpdatesDisabled => write!(f, "updates disabled"),
            SkipReason::CloningDisabled => write!(f, "cloning disabled"),
            SkipReason::BrokenNoRepair => write!(f, "broken, repair disabled"),
            SkipReason::ProbeFailed => write!(f, "local state unreadable"),
            SkipReason::MalformedRecord => write!(f, "record has no clone url"),
            SkipReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Outcome of one action against one repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResult {
    /// Repository identifier in `owner/name` form.
    pub repo: String,
    /// The action that was planned for this repository.
    pub action: ActionKind,
    /// Whether the action resolved without an operation failure.
    pub success: bool,
    /// Wall-clock time spent on the action, including any retry.
    pub duration_ms: u64,
    /// Present when the action was a skip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
    /// Failure classification when the action failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FailureKind>,
    /// Human-readable failure message when the action failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Objects and bytes transferred, when the operation moved data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer: Option<TransferStats>,
    /// True when the operation succeeded or failed on its second attempt.
    #[serde(default)]
    pub retried: bool,
}

impl SyncResult {
    /// A skip recorded at planning time. Skips take no wall-clock time.
    pub fn skipped(repo: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            repo: repo.into(),
            action: ActionKind::Skip,
            success: true,
            duration_ms: 0,
            skip_reason: Some(reason),
            error_kind: None,
            error: None,
            transfer: None,
            retried: false,
        }
    }

    /// A completed operation.
    pub fn succeeded(
        repo: impl Into<String>,
        action: ActionKind,
        duration: Duration,
        transfer: Option<TransferStats>,
        retried: bool,
    ) -> Self {
        Self {
            repo: repo.into(),
            action,
            success: true,
            duration_ms: duration.as_millis() as u64,
            skip_reason: None,
            error_kind: None,
            error: None,
            transfer,
            retried,
        }
    }

    /// A failed operation, classified by the error that stopped it.
    pub fn failed(
        repo: impl Into<String>,
        action: ActionKind,
        duration: Duration,
        error: &mirror_git::Error,
        retried: bool,
    ) -> Self {
        Self {
            repo: repo.into(),
            action,
            success: false,
            duration_ms: duration.as_millis() as u64,
            skip_reason: None,
            error_kind: Some(error.kind()),
            error: Some(error.to_string()),
            transfer: None,
            retried,
        }
    }

    /// True when this result is a skip of warning or error severity.
    pub fn needs_attention(&self) -> bool {
        self.skip_reason
            .map(|r| r.is_warning() || r.is_error())
            .unwrap_or(false)
    }
}

/// Tallies over one batch run. All counts are derived from the result list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounts {
    /// Planned actions, one per catalog record.
    pub total: usize,
    /// Successful clone operations.
    pub cloned: usize,
    /// Successful fast-forward updates.
    pub updated: usize,
    /// Successful repairs.
    pub repaired: usize,
    /// Operations that failed after any retry.
    pub failed: usize,
    /// Actions resolved without running an operation.
    pub skipped: usize,
    /// Skips of warning severity, such as broken clones left in place.
    pub warnings: usize,
    /// Skips caused by malformed records or unreadable local state.
    pub planning_errors: usize,
}

impl BatchCounts {
    fn record(&mut self, result: &SyncResult) {
        self.total += 1;
        if let Some(reason) = result.skip_reason {
            self.skipped += 1;
            if reason.is_warning() {
                self.warnings += 1;
            }
            if reason.is_error() {
                self.planning_errors += 1;
            }
            return;
        }
        if !result.success {
            self.failed += 1;
            return;
        }
        match result.action {
            ActionKind::Clone => self.cloned += 1,
            ActionKind::Update => self.updated += 1,
            ActionKind::Repair => self.repaired += 1,
            ActionKind::Skip => {}
        }
    }

    /// Successful operations across all action kinds.
    pub fn succeeded(&self) -> usize {
        self.cloned + self.updated + self.repaired
    }
}

/// Aggregate outcome of one batch run, in catalog order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub counts: BatchCounts,
    pub results: Vec<SyncResult>,
}

impl BatchReport {
    /// Build a report from per-repository results, deriving all counts.
    pub fn from_results(
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        results: Vec<SyncResult>,
    ) -> Self {
        let mut counts = BatchCounts::default();
        for result in &results {
            counts.record(result);
        }
        let duration_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;
        Self {
            started_at,
            finished_at,
            duration_ms,
            counts,
            results,
        }
    }

    /// Operations that failed, for follow-up.
    pub fn failures(&self) -> impl Iterator<Item = &SyncResult> {
        self.results.iter().filter(|r| !r.success)
    }

    /// True when every operation succeeded and no skip needs attention.
    pub fn is_clean(&self) -> bool {
        self.counts.failed == 0 && self.counts.warnings == 0 && self.counts.planning_errors == 0
    }

    /// True when at least one operation failed.
    pub fn has_failures(&self) -> bool {
        self.counts.failed > 0
    }
}
