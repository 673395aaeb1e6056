//! Concurrent batch runs over a planned action list.
//!
//! Planned operations are pushed through a bounded worker pool. Workers pull
//! actions from a shared channel and send results back to a single
//! aggregating thread, which owns the report and the progress callback. No
//! repository is ever touched by two workers, and a failure in one worker's
//! action never stops the others.

use crate::execute::{DEFAULT_RETRY_PAUSE, DEFAULT_TIMEOUT, Executor};
use crate::plan::{SyncAction, SyncOptions, plan};
use crate::progress::{CancelFlag, ProgressEvent};
use crate::report::{BatchReport, SkipReason, SyncResult};
use chrono::Utc;
use crossbeam::channel::bounded;
use mirror_git::{FailureKind, RepoBackend, StateProbe};
use mirror_remote::{MirrorLayout, RemoteRepo, Transport};
use std::time::Duration;
use tracing::{error, info};

/// Worker pool size when the caller does not choose one: one thread per
/// core minus one for the aggregator, kept between 4 and 8.
pub fn default_workers() -> usize {
    num_cpus::get().saturating_sub(1).clamp(4, 8)
}

/// Drives a full batch run: plan, execute concurrently, aggregate.
pub struct Orchestrator<'a> {
    backend: &'a dyn RepoBackend,
    probe: &'a dyn StateProbe,
    workers: usize,
    timeout: Duration,
    retry_pause: Duration,
    transport: Transport,
    cancel: CancelFlag,
}

impl<'a> Orchestrator<'a> {
    pub fn new(backend: &'a dyn RepoBackend, probe: &'a dyn StateProbe) -> Self {
        Self {
            backend,
            probe,
            workers: default_workers(),
            timeout: DEFAULT_TIMEOUT,
            retry_pause: DEFAULT_RETRY_PAUSE,
            transport: Transport::default(),
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_pause(mut self, pause: Duration) -> Self {
        self.retry_pause = pause;
        self
    }

    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Share a cancellation handle with the caller. Cancelling stops
    /// dispatch of pending actions; running ones finish normally.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Plan without executing, for dry runs.
    pub fn plan_only(
        &self,
        catalog: &[RemoteRepo],
        layout: &MirrorLayout,
        options: &SyncOptions,
    ) -> Vec<SyncAction> {
        plan(catalog, layout, self.probe, options)
    }

    /// Run the whole catalog and report every planned action exactly once.
    ///
    /// `on_progress` fires on the aggregating thread after each action
    /// resolves, skips included. The report lists results in catalog order
    /// regardless of completion order.
    pub fn run(
        &self,
        catalog: &[RemoteRepo],
        layout: &MirrorLayout,
        options: &SyncOptions,
        on_progress: impl Fn(&ProgressEvent),
    ) -> BatchReport {
        let started_at = Utc::now();
        let actions = plan(catalog, layout, self.probe, options);
        let total = actions.len();

        let pending: Vec<(usize, &SyncAction)> = actions
            .iter()
            .enumerate()
            .filter(|(_, action)| !action.is_skip())
            .collect();
        let worker_count = self.workers.min(pending.len().max(1));
        info!(
            total,
            to_execute = pending.len(),
            workers = worker_count,
            "starting batch run"
        );

        let executor = Executor::new(self.backend)
            .with_timeout(self.timeout)
            .with_retry_pause(self.retry_pause)
            .with_transport(self.transport);

        let mut slots: Vec<Option<SyncResult>> = (0..total).map(|_| None).collect();
        let mut completed = 0usize;

        // Skips resolve at planning time and are reported up front.
        for (idx, action) in actions.iter().enumerate() {
            if let SyncAction::Skip { repo, reason } = action {
                let result = SyncResult::skipped(repo.full_name(), *reason);
                completed += 1;
                on_progress(&ProgressEvent::from_result(&result, completed, total));
                slots[idx] = Some(result);
            }
        }

        if !pending.is_empty() {
            let (work_tx, work_rx) = bounded::<(usize, &SyncAction)>(pending.len());
            let (result_tx, result_rx) = bounded::<(usize, SyncResult)>(worker_count);

            let scope_result = crossbeam::thread::scope(|s| {
                for _ in 0..worker_count {
                    let work_rx = work_rx.clone();
                    let result_tx = result_tx.clone();
                    let cancel = self.cancel.clone();
                    let executor = &executor;
                    s.spawn(move |_| {
                        while let Ok((idx, action)) = work_rx.recv() {
                            let result = if cancel.is_cancelled() {
                                SyncResult::skipped(
                                    action.repo().full_name(),
                                    SkipReason::Cancelled,
                                )
                            } else {
                                executor.execute(action)
                            };
                            if result_tx.send((idx, result)).is_err() {
                                break;
                            }
                        }
                    });
                }

                // Capacity matches the queue, so sends cannot block. A send
                // only fails if every worker is already gone.
                for item in &pending {
                    if work_tx.send(*item).is_err() {
                        break;
                    }
                }
                drop(work_tx);
                drop(result_tx);

                while let Ok((idx, result)) = result_rx.recv() {
                    completed += 1;
                    on_progress(&ProgressEvent::from_result(&result, completed, total));
                    slots[idx] = Some(result);
                }
            });
            if scope_result.is_err() {
                error!("a worker thread panicked during the batch run");
            }
        }

        // A dead worker must not make the report lose its action.
        for (idx, slot) in slots.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(SyncResult {
                    repo: actions[idx].repo().full_name(),
                    action: actions[idx].kind(),
                    success: false,
                    duration_ms: 0,
                    skip_reason: None,
                    error_kind: Some(FailureKind::Other),
                    error: Some("worker terminated before reporting a result".to_string()),
                    transfer: None,
                    retried: false,
                });
            }
        }

        let results: Vec<SyncResult> = slots.into_iter().flatten().collect();
        let report = BatchReport::from_results(started_at, Utc::now(), results);
        info!(
            succeeded = report.counts.succeeded(),
            failed = report.counts.failed,
            skipped = report.counts.skipped,
            duration_ms = report.duration_ms,
            "batch run finished"
        );
        report
    }
}
