//! Error types for mirror-remote

/// Result type for mirror-remote operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or interpreting a catalog
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Fs(#[from] mirror_fs::Error),

    #[error("Catalog record '{name}' is malformed: {reason}")]
    MalformedRecord { name: String, reason: String },
}

impl Error {
    pub fn malformed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
