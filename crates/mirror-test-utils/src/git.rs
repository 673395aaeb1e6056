//! Git repository fixtures in sync-relevant states.
//!
//! All fixtures use git2 plumbing with a fixed signature, so they are
//! independent of the host's git configuration.

use std::fs;
use std::path::Path;

use git2::{Repository, RepositoryInitOptions, Signature};

fn test_signature() -> Signature<'static> {
    Signature::now("Mirror Test", "mirror@test.invalid")
        .unwrap_or_else(|e| panic!("test_signature: {e}"))
}

/// Initialises a repository at `path` with one commit on `main`.
///
/// Serves as the origin side of clone/fetch tests: clone it through its
/// filesystem path, then advance it with [`commit_file`] to make clones
/// stale.
///
/// # Panics
/// Panics if any git operation fails.
pub fn origin_with_commit(path: &Path) -> Repository {
    fs::create_dir_all(path)
        .unwrap_or_else(|e| panic!("origin_with_commit: failed to create {}: {e}", path.display()));

    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    let repo = Repository::init_opts(path, &opts)
        .unwrap_or_else(|e| panic!("origin_with_commit: init failed at {}: {e}", path.display()));

    fs::write(path.join("README.md"), "# origin\n")
        .unwrap_or_else(|e| panic!("origin_with_commit: failed to write README.md: {e}"));

    {
        let mut index = repo.index().unwrap_or_else(|e| panic!("origin_with_commit: {e}"));
        index
            .add_path(Path::new("README.md"))
            .unwrap_or_else(|e| panic!("origin_with_commit: {e}"));
        index.write().unwrap_or_else(|e| panic!("origin_with_commit: {e}"));
        let tree_id = index
            .write_tree()
            .unwrap_or_else(|e| panic!("origin_with_commit: {e}"));
        let tree = repo
            .find_tree(tree_id)
            .unwrap_or_else(|e| panic!("origin_with_commit: {e}"));
        let sig = test_signature();
        repo.commit(Some("HEAD"), &sig, &sig, "initial commit", &tree, &[])
            .unwrap_or_else(|e| panic!("origin_with_commit: commit failed: {e}"));
    }

    repo
}

/// Adds a commit touching `file` to the repository at `path` and returns the
/// new tip id.
///
/// # Panics
/// Panics if any git operation fails.
pub fn commit_file(path: &Path, file: &str, content: &str) -> git2::Oid {
    let repo = Repository::open(path)
        .unwrap_or_else(|e| panic!("commit_file: open failed at {}: {e}", path.display()));

    fs::write(path.join(file), content)
        .unwrap_or_else(|e| panic!("commit_file: failed to write {file}: {e}"));

    let mut index = repo.index().unwrap_or_else(|e| panic!("commit_file: {e}"));
    index
        .add_path(Path::new(file))
        .unwrap_or_else(|e| panic!("commit_file: {e}"));
    index.write().unwrap_or_else(|e| panic!("commit_file: {e}"));
    let tree_id = index.write_tree().unwrap_or_else(|e| panic!("commit_file: {e}"));
    let tree = repo
        .find_tree(tree_id)
        .unwrap_or_else(|e| panic!("commit_file: {e}"));

    let parent = repo
        .head()
        .and_then(|h| h.peel_to_commit())
        .unwrap_or_else(|e| panic!("commit_file: no HEAD commit: {e}"));
    let sig = test_signature();
    repo.commit(
        Some("HEAD"),
        &sig,
        &sig,
        &format!("update {file}"),
        &tree,
        &[&parent],
    )
    .unwrap_or_else(|e| panic!("commit_file: commit failed: {e}"))
}

/// Clones the repository at `origin` to `dest` through the filesystem,
/// leaving a normal `origin` remote with tracking refs.
///
/// # Panics
/// Panics if the clone fails.
pub fn clone_local(origin: &Path, dest: &Path) -> Repository {
    git2::build::RepoBuilder::new()
        .clone(&origin.to_string_lossy(), dest)
        .unwrap_or_else(|e| {
            panic!(
                "clone_local: clone {} -> {} failed: {e}",
                origin.display(),
                dest.display()
            )
        })
}

/// Creates a directory that looks like a repository but has corrupt git
/// metadata (a `.git` directory with an unreadable HEAD and no object store).
///
/// # Panics
/// Panics if the filesystem operations fail.
pub fn corrupt_git_dir(path: &Path) {
    fs::create_dir_all(path.join(".git"))
        .unwrap_or_else(|e| panic!("corrupt_git_dir: failed to create .git: {e}"));
    fs::write(path.join(".git/HEAD"), "not a ref\n")
        .unwrap_or_else(|e| panic!("corrupt_git_dir: failed to write HEAD: {e}"));
}

/// Detaches HEAD of the repository at `path` onto its current tip commit.
///
/// # Panics
/// Panics if any git operation fails.
pub fn detach_head(path: &Path) {
    let repo = Repository::open(path)
        .unwrap_or_else(|e| panic!("detach_head: open failed at {}: {e}", path.display()));
    let tip = repo
        .head()
        .and_then(|h| h.peel_to_commit())
        .unwrap_or_else(|e| panic!("detach_head: no HEAD commit: {e}"));
    repo.set_head_detached(tip.id())
        .unwrap_or_else(|e| panic!("detach_head: {e}"));
}
