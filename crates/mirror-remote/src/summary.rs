//! Aggregate catalog statistics

use std::collections::BTreeMap;

use serde::Serialize;

use crate::RemoteRepo;

/// Tallies over one catalog snapshot, shown by `mirror list`.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct CatalogSummary {
    pub total: usize,
    pub private: usize,
    pub forks: usize,
    pub archived: usize,
    /// Repositories per language tag, sorted by language name.
    pub languages: BTreeMap<String, usize>,
    pub total_size_kb: u64,
}

impl CatalogSummary {
    pub fn from_records(records: &[RemoteRepo]) -> Self {
        let mut summary = Self {
            total: records.len(),
            ..Self::default()
        };
        for repo in records {
            if repo.private {
                summary.private += 1;
            }
            if repo.fork {
                summary.forks += 1;
            }
            if repo.archived {
                summary.archived += 1;
            }
            if let Some(language) = &repo.language {
                *summary.languages.entry(language.clone()).or_insert(0) += 1;
            }
            summary.total_size_kb += repo.size_kb.unwrap_or(0);
        }
        summary
    }

    /// Languages ordered by repository count, most used first. Ties break
    /// alphabetically.
    pub fn languages_by_count(&self) -> Vec<(&str, usize)> {
        let mut pairs: Vec<(&str, usize)> = self
            .languages
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        pairs.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        pairs
    }
}
