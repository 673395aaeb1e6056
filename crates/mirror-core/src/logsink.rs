//! JSON audit logs, one file per run.
//!
//! Every batch run can be persisted under the mirror's log directory so an
//! operator can reconstruct what happened after the terminal is gone.

use crate::plan::SyncOptions;
use crate::report::BatchReport;
use mirror_fs::NormalizedPath;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One run, ready for serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLog {
    /// The command that produced the run, such as `sync` or `plan`.
    pub operation: String,
    pub options: SyncOptions,
    pub report: BatchReport,
}

impl RunLog {
    pub fn new(operation: impl Into<String>, options: SyncOptions, report: BatchReport) -> Self {
        Self {
            operation: operation.into(),
            options,
            report,
        }
    }
}

/// Writes run logs as `<operation>_<YYYYmmdd_HHMMSS>.json`.
pub struct RunLogWriter {
    dir: NormalizedPath,
}

impl RunLogWriter {
    pub fn new(dir: impl Into<NormalizedPath>) -> Self {
        Self { dir: dir.into() }
    }

    /// Persist the log and return its path. The filename timestamp is the
    /// run's start time, so a log sorts next to the run that produced it.
    pub fn write(&self, log: &RunLog) -> crate::Result<NormalizedPath> {
        let stamp = log.report.started_at.format("%Y%m%d_%H%M%S");
        let path = self.dir.join(&format!("{}_{stamp}.json", log.operation));
        mirror_fs::write_json(&path, log)?;
        debug!(path = %path, "run log written");
        Ok(path)
    }
}
