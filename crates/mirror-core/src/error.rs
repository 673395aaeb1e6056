use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Faults surfaced by the engine itself. Per-repository operation failures
/// never appear here; those are folded into the batch report.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Catalog(#[from] mirror_remote::Error),

    #[error(transparent)]
    Git(#[from] mirror_git::Error),

    #[error(transparent)]
    Fs(#[from] mirror_fs::Error),
}
