//! Progress reporting and cancellation for batch runs.

use crate::report::{ActionKind, SkipReason, SyncResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation handle shared between a caller and a run.
///
/// Cancelling stops further dispatch; actions already running finish and
/// land in the report as usual.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Emitted once per resolved action, including skips.
///
/// Events arrive from a single aggregating thread, so observers never see
/// two events at once and `completed` only moves forward.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Repository identifier in `owner/name` form.
    pub repo: String,
    pub action: ActionKind,
    pub success: bool,
    /// Present when the action was a skip.
    pub skip_reason: Option<SkipReason>,
    /// Failure message when the action failed.
    pub error: Option<String>,
    /// Actions resolved so far, this one included.
    pub completed: usize,
    /// Planned actions in the whole run.
    pub total: usize,
}

impl ProgressEvent {
    pub(crate) fn from_result(result: &SyncResult, completed: usize, total: usize) -> Self {
        Self {
            repo: result.repo.clone(),
            action: result.action,
            success: result.success,
            skip_reason: result.skip_reason,
            error: result.error.clone(),
            completed,
            total,
        }
    }
}
