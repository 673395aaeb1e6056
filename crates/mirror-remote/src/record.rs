//! Remote repository records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Preferred clone transport.
///
/// SSH is preferred when a record carries both endpoints; HTTPS is the
/// fallback. The executor tries the candidates in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Ssh,
    Https,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Ssh => write!(f, "ssh"),
            Transport::Https => write!(f, "https"),
        }
    }
}

impl std::str::FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ssh" => Ok(Transport::Ssh),
            "https" => Ok(Transport::Https),
            other => Err(format!("unknown transport '{other}' (expected ssh or https)")),
        }
    }
}

fn default_branch() -> String {
    "main".to_string()
}

/// One remote repository, as reported by the hosting side.
///
/// Records are an immutable snapshot: the engine never mutates them, and a
/// fresh catalog is fetched for every run. Field names follow the hosting
/// API export shape so a raw export file deserializes directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRepo {
    pub owner: String,
    pub name: String,

    /// HTTPS clone endpoint.
    #[serde(default, alias = "clone_url")]
    pub https_url: Option<String>,

    /// SSH clone endpoint.
    #[serde(default)]
    pub ssh_url: Option<String>,

    #[serde(default = "default_branch")]
    pub default_branch: String,

    /// Last push on the remote, used as the freshness signal.
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub private: bool,

    #[serde(default)]
    pub fork: bool,

    #[serde(default)]
    pub archived: bool,

    #[serde(default)]
    pub language: Option<String>,

    /// Size estimate in kilobytes.
    #[serde(default, alias = "size")]
    pub size_kb: Option<u64>,
}

impl RemoteRepo {
    /// `owner/name` form used in reports and log lines.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Whether the record carries at least one clone endpoint.
    pub fn has_clone_url(&self) -> bool {
        self.ssh_url.is_some() || self.https_url.is_some()
    }

    /// Clone endpoints in preference order: the preferred transport first,
    /// the other as fallback. Missing endpoints are omitted.
    pub fn clone_candidates(&self, preferred: Transport) -> Vec<&str> {
        let (first, second) = match preferred {
            Transport::Ssh => (&self.ssh_url, &self.https_url),
            Transport::Https => (&self.https_url, &self.ssh_url),
        };
        [first, second]
            .into_iter()
            .filter_map(|url| url.as_deref())
            .collect()
    }
}
