//! Catalog record builders

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use mirror_remote::RemoteRepo;

/// A timestamp `n` whole days before now, for `pushed_at` comparisons.
pub fn days_ago(n: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(n)
}

/// A minimal catalog record with no clone endpoints.
pub fn record(owner: &str, name: &str) -> RemoteRepo {
    RemoteRepo {
        owner: owner.to_string(),
        name: name.to_string(),
        https_url: None,
        ssh_url: None,
        default_branch: "main".to_string(),
        pushed_at: None,
        private: false,
        fork: false,
        archived: false,
        language: None,
        size_kb: None,
    }
}

/// A record whose HTTPS endpoint points at a local origin fixture, so the
/// real git backend can clone it through the filesystem.
pub fn record_with_origin(owner: &str, name: &str, origin: &Path) -> RemoteRepo {
    RemoteRepo {
        https_url: Some(origin.to_string_lossy().into_owned()),
        pushed_at: Some(Utc::now()),
        ..record(owner, name)
    }
}
