//! Repository operations: clone, fast-forward update, repair
//!
//! Operations are keyed by endpoint URL and local path; the catalog record
//! itself never reaches this layer. Per-operation deadlines are enforced
//! inside the transfer: the progress callback aborts once the deadline
//! passes, and the aborted attempt is reported as a timeout.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{BranchType, Cred, ErrorClass, ErrorCode, FetchOptions, RemoteCallbacks, Repository};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Objects and bytes received by one transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferStats {
    pub objects: usize,
    pub bytes: usize,
}

/// Outcome of an update against a local mirror.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    AlreadyUpToDate,
    FastForwarded { to: String, stats: TransferStats },
}

/// Repository operations the executor dispatches.
///
/// Implementations confine side effects to the target path; nothing here
/// touches sibling repositories. `urls` are clone endpoints in preference
/// order (SSH first by default), tried until one succeeds within the
/// deadline.
pub trait RepoBackend: Send + Sync {
    /// Full clone checked out at `branch`. The target path must not exist.
    fn clone_repo(
        &self,
        urls: &[&str],
        branch: &str,
        path: &Path,
        timeout: Duration,
    ) -> Result<TransferStats>;

    /// Fetch `branch` from origin and fast-forward the local branch.
    /// Repoints a drifted or renamed checkout onto `branch`; never rewrites
    /// diverged history.
    fn update_repo(&self, path: &Path, branch: &str, timeout: Duration) -> Result<UpdateOutcome>;

    /// Remove the local directory and clone fresh. Destructive by design;
    /// only planned for repositories classified broken.
    fn repair_repo(
        &self,
        urls: &[&str],
        branch: &str,
        path: &Path,
        timeout: Duration,
    ) -> Result<TransferStats>;
}

/// The git2 implementation.
#[derive(Debug, Default)]
pub struct GitBackend;

#[derive(Default)]
struct Transfer {
    objects: AtomicUsize,
    bytes: AtomicUsize,
}

impl Transfer {
    fn snapshot(&self) -> TransferStats {
        TransferStats {
            objects: self.objects.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
        }
    }
}

/// Credentials come from the ssh agent for SSH endpoints and libgit2's
/// default resolution otherwise; key management stays outside this crate.
fn remote_callbacks(deadline: Instant, transfer: Arc<Transfer>) -> RemoteCallbacks<'static> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(|_url, username_from_url, allowed| {
        if allowed.is_ssh_key() {
            return Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"));
        }
        if allowed.is_default() {
            return Cred::default();
        }
        Err(git2::Error::from_str("no supported authentication method"))
    });
    callbacks.transfer_progress(move |progress| {
        transfer
            .objects
            .store(progress.received_objects(), Ordering::Relaxed);
        transfer
            .bytes
            .store(progress.received_bytes(), Ordering::Relaxed);
        Instant::now() < deadline
    });
    callbacks
}

/// Map a git2 transfer failure onto the error taxonomy. A callback abort
/// after the deadline is a timeout; everything else classifies by git2's
/// error class.
pub(crate) fn classify_transfer_error(
    url: &str,
    deadline: Instant,
    timeout: Duration,
    e: git2::Error,
) -> Error {
    if e.code() == ErrorCode::User && Instant::now() >= deadline {
        return Error::Timeout {
            seconds: timeout.as_secs(),
        };
    }
    match (e.class(), e.code()) {
        (_, ErrorCode::Auth) | (ErrorClass::Ssh, _) => Error::AuthenticationFailed {
            url: url.to_string(),
            message: e.message().to_string(),
        },
        (ErrorClass::Net, _) | (ErrorClass::Http, _) => Error::Connection {
            url: url.to_string(),
            message: e.message().to_string(),
        },
        _ => Error::Git(e),
    }
}

impl GitBackend {
    fn try_clone(
        &self,
        url: &str,
        branch: &str,
        path: &Path,
        deadline: Instant,
        timeout: Duration,
    ) -> Result<TransferStats> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let transfer = Arc::new(Transfer::default());
        let mut fetch_opts = FetchOptions::new();
        fetch_opts.remote_callbacks(remote_callbacks(deadline, Arc::clone(&transfer)));

        let cloned = RepoBuilder::new()
            .branch(branch)
            .fetch_options(fetch_opts)
            .clone(url, path);

        match cloned {
            Ok(_) => Ok(transfer.snapshot()),
            Err(e) => {
                // A failed attempt must not leave a half-written clone for
                // the next run to trip over.
                let _ = fs::remove_dir_all(path);
                Err(classify_transfer_error(url, deadline, timeout, e))
            }
        }
    }
}

impl RepoBackend for GitBackend {
    fn clone_repo(
        &self,
        urls: &[&str],
        branch: &str,
        path: &Path,
        timeout: Duration,
    ) -> Result<TransferStats> {
        if urls.is_empty() {
            return Err(Error::NoCloneUrl {
                path: path.to_path_buf(),
            });
        }

        let deadline = Instant::now() + timeout;
        let mut last_err = Error::NoCloneUrl {
            path: path.to_path_buf(),
        };

        for url in urls {
            if Instant::now() >= deadline {
                last_err = Error::Timeout {
                    seconds: timeout.as_secs(),
                };
                break;
            }
            match self.try_clone(url, branch, path, deadline, timeout) {
                Ok(stats) => {
                    tracing::debug!(
                        url = %url,
                        objects = stats.objects,
                        bytes = stats.bytes,
                        "clone complete"
                    );
                    return Ok(stats);
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "clone attempt failed");
                    last_err = e;
                }
            }
        }

        Err(last_err)
    }

    fn update_repo(&self, path: &Path, branch: &str, timeout: Duration) -> Result<UpdateOutcome> {
        let deadline = Instant::now() + timeout;

        let repo = Repository::open(path).map_err(|e| Error::CorruptRepository {
            path: path.to_path_buf(),
            reason: e.message().to_string(),
        })?;

        let mut remote = repo
            .find_remote("origin")
            .map_err(|_| Error::RemoteNotFound {
                name: "origin".to_string(),
            })?;
        let url = remote.url().unwrap_or("origin").to_string();

        let transfer = Arc::new(Transfer::default());
        let mut fetch_opts = FetchOptions::new();
        fetch_opts.remote_callbacks(remote_callbacks(deadline, Arc::clone(&transfer)));
        remote
            .fetch(&[branch], Some(&mut fetch_opts), None)
            .map_err(|e| classify_transfer_error(&url, deadline, timeout, e))?;
        let stats = transfer.snapshot();

        let fetch_commit = repo
            .find_reference("FETCH_HEAD")
            .and_then(|r| r.peel_to_commit())?;
        let refname = format!("refs/heads/{branch}");

        // Default branch renamed on the remote: the local branch does not
        // exist yet. Create it at the fetched tip and repoint the checkout.
        if repo.find_branch(branch, BranchType::Local).is_err() {
            repo.branch(branch, &fetch_commit, false)?;
            repo.set_head(&refname)?;
            repo.checkout_head(Some(CheckoutBuilder::default().force()))?;
            tracing::info!(branch = %branch, "repointed checkout to new default branch");
            return Ok(UpdateOutcome::FastForwarded {
                to: fetch_commit.id().to_string(),
                stats,
            });
        }

        // Drifted checkout: mirrors are not working areas, so put HEAD back
        // on the mirrored branch before the fast-forward analysis.
        if repo.head()?.shorthand() != Some(branch) {
            repo.set_head(&refname)?;
            repo.checkout_head(Some(CheckoutBuilder::default().force()))?;
        }

        let head_commit = repo.head()?.peel_to_commit()?;
        let annotated = repo.find_annotated_commit(fetch_commit.id())?;
        let (analysis, _) = repo.merge_analysis(&[&annotated])?;

        if analysis.is_up_to_date() {
            return Ok(UpdateOutcome::AlreadyUpToDate);
        }

        if analysis.is_fast_forward() {
            let mut reference = repo.find_reference(&refname)?;
            reference.set_target(
                fetch_commit.id(),
                &format!("mirror update: fast-forward to {}", fetch_commit.id()),
            )?;
            repo.checkout_head(Some(CheckoutBuilder::default().force()))?;
            return Ok(UpdateOutcome::FastForwarded {
                to: fetch_commit.id().to_string(),
                stats,
            });
        }

        Err(Error::DivergedHistory {
            branch: branch.to_string(),
            local: head_commit.id().to_string(),
            remote: fetch_commit.id().to_string(),
        })
    }

    fn repair_repo(
        &self,
        urls: &[&str],
        branch: &str,
        path: &Path,
        timeout: Duration,
    ) -> Result<TransferStats> {
        if path.exists() {
            fs::remove_dir_all(path).map_err(|e| match e.kind() {
                std::io::ErrorKind::PermissionDenied => Error::PermissionDenied {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                },
                _ => Error::io(path, e),
            })?;
            tracing::debug!(path = %path.display(), "removed broken repository");
        }
        self.clone_repo(urls, branch, path, timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_test_utils::{clone_local, commit_file, corrupt_git_dir, origin_with_commit};
    use tempfile::TempDir;

    const TIMEOUT: Duration = Duration::from_secs(30);

    fn url_of(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_clone_from_local_origin() {
        let temp = TempDir::new().unwrap();
        let origin = temp.path().join("origin");
        let target = temp.path().join("mirrors/octo/widgets");
        origin_with_commit(&origin);

        GitBackend
            .clone_repo(&[&url_of(&origin)], "main", &target, TIMEOUT)
            .unwrap();

        let repo = Repository::open(&target).unwrap();
        assert_eq!(repo.head().unwrap().shorthand(), Some("main"));
        assert!(target.join("README.md").exists());
    }

    #[test]
    fn test_clone_falls_back_to_second_endpoint() {
        let temp = TempDir::new().unwrap();
        let origin = temp.path().join("origin");
        let target = temp.path().join("target");
        origin_with_commit(&origin);
        let bad = url_of(&temp.path().join("definitely-missing"));

        GitBackend
            .clone_repo(&[&bad, &url_of(&origin)], "main", &target, TIMEOUT)
            .unwrap();

        assert!(Repository::open(&target).is_ok());
    }

    #[test]
    fn test_failed_clone_leaves_no_partial_directory() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("target");
        let bad = url_of(&temp.path().join("definitely-missing"));

        let err = GitBackend
            .clone_repo(&[&bad], "main", &target, TIMEOUT)
            .unwrap_err();

        assert!(!target.exists(), "partial clone left behind: {err}");
    }

    #[test]
    fn test_clone_with_no_urls_fails() {
        let temp = TempDir::new().unwrap();
        let err = GitBackend
            .clone_repo(&[], "main", &temp.path().join("t"), TIMEOUT)
            .unwrap_err();
        assert!(matches!(err, Error::NoCloneUrl { .. }));
    }

    #[test]
    fn test_update_when_current_is_noop() {
        let temp = TempDir::new().unwrap();
        let origin = temp.path().join("origin");
        let local = temp.path().join("local");
        origin_with_commit(&origin);
        clone_local(&origin, &local);

        let outcome = GitBackend.update_repo(&local, "main", TIMEOUT).unwrap();
        assert_eq!(outcome, UpdateOutcome::AlreadyUpToDate);
    }

    #[test]
    fn test_update_fast_forwards_to_new_origin_commit() {
        let temp = TempDir::new().unwrap();
        let origin = temp.path().join("origin");
        let local = temp.path().join("local");
        origin_with_commit(&origin);
        clone_local(&origin, &local);
        let new_tip = commit_file(&origin, "extra.txt", "more");

        let outcome = GitBackend.update_repo(&local, "main", TIMEOUT).unwrap();

        match outcome {
            UpdateOutcome::FastForwarded { to, .. } => assert_eq!(to, new_tip.to_string()),
            other => panic!("expected fast-forward, got {other:?}"),
        }
        let repo = Repository::open(&local).unwrap();
        assert_eq!(repo.head().unwrap().peel_to_commit().unwrap().id(), new_tip);
        assert!(local.join("extra.txt").exists());
    }

    #[test]
    fn test_update_refuses_diverged_history() {
        let temp = TempDir::new().unwrap();
        let origin = temp.path().join("origin");
        let local = temp.path().join("local");
        origin_with_commit(&origin);
        clone_local(&origin, &local);
        commit_file(&origin, "upstream.txt", "theirs");
        let local_tip = commit_file(&local, "local.txt", "ours");

        let err = GitBackend.update_repo(&local, "main", TIMEOUT).unwrap_err();

        assert!(matches!(err, Error::DivergedHistory { .. }));
        // Local history is untouched after the refusal.
        let repo = Repository::open(&local).unwrap();
        assert_eq!(
            repo.head().unwrap().peel_to_commit().unwrap().id(),
            local_tip
        );
    }

    #[test]
    fn test_update_repoints_renamed_default_branch() {
        let temp = TempDir::new().unwrap();
        let origin = temp.path().join("origin");
        let local = temp.path().join("local");
        origin_with_commit(&origin);
        clone_local(&origin, &local);

        // Rename the default branch on the origin side.
        let origin_repo = Repository::open(&origin).unwrap();
        let mut main = origin_repo.find_branch("main", BranchType::Local).unwrap();
        main.rename("trunk", false).unwrap();
        origin_repo.set_head("refs/heads/trunk").unwrap();

        let outcome = GitBackend.update_repo(&local, "trunk", TIMEOUT).unwrap();

        assert!(matches!(outcome, UpdateOutcome::FastForwarded { .. }));
        let repo = Repository::open(&local).unwrap();
        assert_eq!(repo.head().unwrap().shorthand(), Some("trunk"));
    }

    #[test]
    fn test_update_repoints_drifted_checkout() {
        let temp = TempDir::new().unwrap();
        let origin = temp.path().join("origin");
        let local = temp.path().join("local");
        origin_with_commit(&origin);
        let repo = clone_local(&origin, &local);

        let tip = repo.head().unwrap().peel_to_commit().unwrap();
        repo.branch("scratch", &tip, false).unwrap();
        repo.set_head("refs/heads/scratch").unwrap();

        let outcome = GitBackend.update_repo(&local, "main", TIMEOUT).unwrap();

        assert_eq!(outcome, UpdateOutcome::AlreadyUpToDate);
        let repo = Repository::open(&local).unwrap();
        assert_eq!(repo.head().unwrap().shorthand(), Some("main"));
    }

    #[test]
    fn test_update_without_origin_is_integrity_failure() {
        let temp = TempDir::new().unwrap();
        let lone = temp.path().join("lone");
        origin_with_commit(&lone);

        let err = GitBackend.update_repo(&lone, "main", TIMEOUT).unwrap_err();
        assert!(matches!(err, Error::RemoteNotFound { .. }));
        assert_eq!(err.kind(), crate::FailureKind::IntegrityFailure);
    }

    #[test]
    fn test_repair_replaces_corrupt_directory() {
        let temp = TempDir::new().unwrap();
        let origin = temp.path().join("origin");
        let target = temp.path().join("target");
        origin_with_commit(&origin);
        std::fs::create_dir_all(&target).unwrap();
        corrupt_git_dir(&target);

        GitBackend
            .repair_repo(&[&url_of(&origin)], "main", &target, TIMEOUT)
            .unwrap();

        let repo = Repository::open(&target).unwrap();
        assert_eq!(repo.head().unwrap().shorthand(), Some("main"));
    }

    #[test]
    fn test_classify_deadline_abort_as_timeout() {
        let deadline = Instant::now() - Duration::from_secs(1);
        let err = classify_transfer_error(
            "git@h:o/w.git",
            deadline,
            Duration::from_secs(5),
            git2::Error::new(ErrorCode::User, ErrorClass::Callback, "aborted"),
        );
        assert!(matches!(err, Error::Timeout { seconds: 5 }));
    }

    #[test]
    fn test_classify_net_and_auth_errors() {
        let deadline = Instant::now() + Duration::from_secs(60);
        let timeout = Duration::from_secs(60);

        let err = classify_transfer_error(
            "https://h/o/w.git",
            deadline,
            timeout,
            git2::Error::new(ErrorCode::GenericError, ErrorClass::Net, "unreachable"),
        );
        assert!(matches!(err, Error::Connection { .. }));

        let err = classify_transfer_error(
            "git@h:o/w.git",
            deadline,
            timeout,
            git2::Error::new(ErrorCode::Auth, ErrorClass::Http, "401"),
        );
        assert!(matches!(err, Error::AuthenticationFailed { .. }));

        let err = classify_transfer_error(
            "git@h:o/w.git",
            deadline,
            timeout,
            git2::Error::new(ErrorCode::GenericError, ErrorClass::Ssh, "no agent"),
        );
        assert!(matches!(err, Error::AuthenticationFailed { .. }));
    }
}
