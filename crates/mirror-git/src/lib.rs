//! git2-backed local repository layer for Mirror Manager
//!
//! Three pieces the sync engine builds on:
//!
//! - [`probe`]: classifies one local path against the expected default
//!   branch (absent, present, stale, broken, unknown)
//! - [`backend`]: clone, fetch + fast-forward update, and repair
//!   operations behind the [`RepoBackend`] trait, with per-operation
//!   deadlines enforced inside the transfer
//! - [`health`]: standalone integrity check for local working copies
//!
//! Updates never rewrite history: a branch that cannot be fast-forwarded
//! fails with [`Error::DivergedHistory`] and the local repository is left
//! untouched.

pub mod backend;
pub mod error;
pub mod health;
pub mod probe;

pub use backend::{GitBackend, RepoBackend, TransferStats, UpdateOutcome};
pub use error::{Error, FailureKind, Result};
pub use health::{HealthStatus, check_health};
pub use probe::{GitProbe, LocalState, StaleReason, StateProbe};
