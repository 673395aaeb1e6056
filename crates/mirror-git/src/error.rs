//! Error types for mirror-git

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Result type for mirror-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure classification recorded in sync results.
///
/// Transient kinds are eligible for the executor's single retry; everything
/// else is permanent for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ConnectionError,
    Timeout,
    AuthenticationFailed,
    PermissionDenied,
    DivergedHistory,
    IntegrityFailure,
    Other,
}

impl FailureKind {
    pub fn is_transient(&self) -> bool {
        matches!(self, FailureKind::ConnectionError | FailureKind::Timeout)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FailureKind::ConnectionError => "connection error",
            FailureKind::Timeout => "timeout",
            FailureKind::AuthenticationFailed => "authentication failed",
            FailureKind::PermissionDenied => "permission denied",
            FailureKind::DivergedHistory => "diverged history",
            FailureKind::IntegrityFailure => "integrity failure",
            FailureKind::Other => "other",
        };
        write!(f, "{label}")
    }
}

/// Errors that can occur in mirror-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Connection to {url} failed: {message}")]
    Connection { url: String, message: String },

    #[error("Operation exceeded its {seconds}s deadline")]
    Timeout { seconds: u64 },

    #[error("Authentication to {url} failed: {message}")]
    AuthenticationFailed { url: String, message: String },

    #[error("Permission denied at {path}: {message}")]
    PermissionDenied { path: PathBuf, message: String },

    #[error(
        "Branch '{branch}' has diverged from its remote ({local} vs {remote}); refusing to rewrite local history"
    )]
    DivergedHistory {
        branch: String,
        local: String,
        remote: String,
    },

    #[error("Repository at {path} is corrupt: {reason}")]
    CorruptRepository { path: PathBuf, reason: String },

    #[error("Remote '{name}' not found")]
    RemoteNotFound { name: String },

    #[error("No clone endpoint available for {path}")]
    NoCloneUrl { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Classification used for retry decisions and report accounting.
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::Connection { .. } => FailureKind::ConnectionError,
            Error::Timeout { .. } => FailureKind::Timeout,
            Error::AuthenticationFailed { .. } => FailureKind::AuthenticationFailed,
            Error::PermissionDenied { .. } => FailureKind::PermissionDenied,
            Error::DivergedHistory { .. } => FailureKind::DivergedHistory,
            Error::CorruptRepository { .. } | Error::RemoteNotFound { .. } => {
                FailureKind::IntegrityFailure
            }
            Error::Io { source, .. }
                if source.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                FailureKind::PermissionDenied
            }
            Error::Git(_) | Error::Io { .. } | Error::NoCloneUrl { .. } => FailureKind::Other,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind().is_transient()
    }
}
