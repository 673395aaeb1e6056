//! Runs planned actions against a git backend.
//!
//! The executor owns the retry policy: transient failures get exactly one
//! more attempt after a short pause, everything else fails immediately.
//! Timeouts apply per attempt, not per action.

use crate::plan::SyncAction;
use crate::report::{ActionKind, SyncResult};
use mirror_git::{RepoBackend, TransferStats, UpdateOutcome};
use mirror_remote::{RemoteRepo, Transport};
use std::time::{Duration, Instant};
use tracing::warn;

/// Upper bound for a single clone, fetch, or repair attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Pause between the first attempt and the single retry.
pub const DEFAULT_RETRY_PAUSE: Duration = Duration::from_secs(2);

/// Executes one action at a time. Cheap to share across worker threads.
pub struct Executor<'a> {
    backend: &'a dyn RepoBackend,
    timeout: Duration,
    retry_pause: Duration,
    transport: Transport,
}

impl<'a> Executor<'a> {
    pub fn new(backend: &'a dyn RepoBackend) -> Self {
        Self {
            backend,
            timeout: DEFAULT_TIMEOUT,
            retry_pause: DEFAULT_RETRY_PAUSE,
            transport: Transport::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_pause(mut self, pause: Duration) -> Self {
        self.retry_pause = pause;
        self
    }

    /// Which clone URL to try first when a record offers both.
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Run one action to completion and report what happened.
    ///
    /// Never panics and never returns early: every failure is folded into
    /// the returned [`SyncResult`] so one repository cannot take down a
    /// batch.
    pub fn execute(&self, action: &SyncAction) -> SyncResult {
        match action {
            SyncAction::Skip { repo, reason } => SyncResult::skipped(repo.full_name(), *reason),
            SyncAction::Clone { repo, path } => {
                let urls = repo.clone_candidates(self.transport);
                self.run_with_retry(repo, ActionKind::Clone, || {
                    self.backend
                        .clone_repo(&urls, &repo.default_branch, &path.to_native(), self.timeout)
                        .map(Some)
                })
            }
            SyncAction::Update { repo, path } => {
                self.run_with_retry(repo, ActionKind::Update, || {
                    self.backend
                        .update_repo(&path.to_native(), &repo.default_branch, self.timeout)
                        .map(|outcome| match outcome {
                            UpdateOutcome::AlreadyUpToDate => None,
                            UpdateOutcome::FastForwarded { stats, .. } => Some(stats),
                        })
                })
            }
            SyncAction::Repair { repo, path } => {
                let urls = repo.clone_candidates(self.transport);
                self.run_with_retry(repo, ActionKind::Repair, || {
                    self.backend
                        .repair_repo(&urls, &repo.default_branch, &path.to_native(), self.timeout)
                        .map(Some)
                })
            }
        }
    }

    fn run_with_retry(
        &self,
        repo: &RemoteRepo,
        kind: ActionKind,
        op: impl Fn() -> mirror_git::Result<Option<TransferStats>>,
    ) -> SyncResult {
        let name = repo.full_name();
        let started = Instant::now();
        match op() {
            Ok(transfer) => SyncResult::succeeded(&name, kind, started.elapsed(), transfer, false),
            Err(first) if first.is_transient() => {
                warn!(repo = %name, action = %kind, error = %first, "transient failure, retrying once");
                std::thread::sleep(self.retry_pause);
                match op() {
                    Ok(transfer) => {
                        SyncResult::succeeded(&name, kind, started.elapsed(), transfer, true)
                    }
                    Err(second) => {
                        warn!(repo = %name, action = %kind, error = %second, "retry failed");
                        SyncResult::failed(&name, kind, started.elapsed(), &second, true)
                    }
                }
            }
            Err(first) => SyncResult::failed(&name, kind, started.elapsed(), &first, false),
        }
    }
}
