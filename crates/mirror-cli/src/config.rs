//! CLI configuration: a TOML file merged under command-line flags.
//!
//! Resolution order is flags, then the config file, then built-in defaults.
//! The file lives at `<config dir>/mirror/config.toml` unless `--config`
//! points elsewhere.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use mirror_core::{DEFAULT_TIMEOUT, default_workers};
use mirror_fs::NormalizedPath;
use mirror_remote::Transport;

use crate::error::{CliError, Result};

/// On-disk settings. Every field is optional; flags fill the gaps.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Mirror root directory.
    pub root: Option<PathBuf>,
    /// Catalog file with remote repository records.
    pub catalog: Option<PathBuf>,
    /// Worker threads for sync runs.
    pub workers: Option<usize>,
    /// Per-operation timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Preferred clone transport, `ssh` or `https`.
    pub transport: Option<String>,
}

impl FileConfig {
    /// Load from `path`, or from the default location when `path` is None.
    /// A missing default file is an empty config; a missing explicit file
    /// is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let location = match path {
            Some(p) => p.to_path_buf(),
            None => match default_location() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !location.exists() {
            if path.is_some() {
                return Err(CliError::user(format!(
                    "config file not found: {}",
                    location.display()
                )));
            }
            return Ok(Self::default());
        }

        let body = fs::read_to_string(&location)?;
        toml::from_str(&body).map_err(|e| {
            CliError::user(format!("invalid config file {}: {e}", location.display()))
        })
    }
}

fn default_location() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mirror").join("config.toml"))
}

/// Effective settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub root: NormalizedPath,
    pub catalog: NormalizedPath,
    pub workers: usize,
    pub timeout: Duration,
    pub transport: Transport,
}

impl Settings {
    pub fn resolve(
        config: Option<&Path>,
        root: Option<&Path>,
        catalog: Option<&Path>,
        jobs: Option<usize>,
        timeout_secs: Option<u64>,
        transport: Option<&str>,
    ) -> Result<Self> {
        let file = FileConfig::load(config)?;

        let root = root
            .map(NormalizedPath::new)
            .or(file.root.map(NormalizedPath::new))
            .ok_or_else(|| {
                CliError::user(
                    "no mirror root configured; pass --root or set `root` in the config file",
                )
            })?;
        let catalog = catalog
            .map(NormalizedPath::new)
            .or(file.catalog.map(NormalizedPath::new))
            .ok_or_else(|| {
                CliError::user(
                    "no catalog configured; pass --catalog or set `catalog` in the config file",
                )
            })?;

        let workers = jobs.or(file.workers).unwrap_or_else(default_workers).max(1);
        let timeout = timeout_secs
            .or(file.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        let transport = match transport.or(file.transport.as_deref()) {
            Some(value) => value
                .parse::<Transport>()
                .map_err(|e| CliError::user(format!("invalid transport: {e}")))?,
            None => Transport::default(),
        };

        Ok(Self {
            root,
            catalog,
            workers,
            timeout,
            transport,
        })
    }
}
