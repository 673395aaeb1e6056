//! Shared test fixtures for the mirror-manager workspace.
//!
//! Git repositories in the states the sync engine has to handle (healthy
//! origin/clone pairs, stale and diverged clones, corrupt metadata) plus
//! catalog record builders. Dev-dependency only, never published.

pub mod catalog;
pub mod git;

pub use catalog::{days_ago, record, record_with_origin};
pub use git::{
    clone_local, commit_file, corrupt_git_dir, detach_head, origin_with_commit,
};
