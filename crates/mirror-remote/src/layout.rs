//! On-disk mirror layout
//!
//! Every record maps deterministically to `<root>/<owner>/<name>`. Keeping
//! the owner level avoids collisions between forks that share a repository
//! name. Run logs live under `<root>/.mirror/logs`, outside any owner
//! directory.

use std::collections::HashSet;
use std::fs;

use mirror_fs::NormalizedPath;

use crate::{Error, RemoteRepo, Result};

/// Internal directory name reserved for engine state under the mirror root.
const STATE_DIR: &str = ".mirror";

/// Maps catalog records to local paths under a mirror root.
#[derive(Debug, Clone)]
pub struct MirrorLayout {
    root: NormalizedPath,
}

impl MirrorLayout {
    pub fn new(root: impl Into<NormalizedPath>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    /// Local working copy path for one record.
    pub fn path_for(&self, repo: &RemoteRepo) -> NormalizedPath {
        self.root.join(&repo.owner).join(&repo.name)
    }

    /// Directory that receives run log records.
    pub fn logs_dir(&self) -> NormalizedPath {
        self.root.join(STATE_DIR).join("logs")
    }

    /// Local `<owner>/<name>` directories that no catalog record claims.
    ///
    /// Purely observational: callers report orphans, nothing here deletes
    /// them. Hidden entries and loose files are ignored.
    pub fn orphans(&self, catalog: &[RemoteRepo]) -> Result<Vec<NormalizedPath>> {
        let known: HashSet<String> = catalog
            .iter()
            .map(|r| format!("{}/{}", r.owner.to_ascii_lowercase(), r.name.to_ascii_lowercase()))
            .collect();

        let mut orphans = Vec::new();
        if !self.root.is_dir() {
            return Ok(orphans);
        }

        for owner_entry in read_dir_sorted(&self.root)? {
            let owner_path = self.root.join(&owner_entry);
            if owner_entry.starts_with('.') || !owner_path.is_dir() {
                continue;
            }
            for repo_entry in read_dir_sorted(&owner_path)? {
                let repo_path = owner_path.join(&repo_entry);
                if repo_entry.starts_with('.') || !repo_path.is_dir() {
                    continue;
                }
                let key = format!(
                    "{}/{}",
                    owner_entry.to_ascii_lowercase(),
                    repo_entry.to_ascii_lowercase()
                );
                if !known.contains(&key) {
                    orphans.push(repo_path);
                }
            }
        }

        Ok(orphans)
    }
}

fn read_dir_sorted(dir: &NormalizedPath) -> Result<Vec<String>> {
    let native = dir.to_native();
    let entries = fs::read_dir(&native).map_err(|e| Error::Fs(mirror_fs::Error::io(&native, e)))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::Fs(mirror_fs::Error::io(&native, e)))?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}
