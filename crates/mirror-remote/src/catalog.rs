//! Catalog sources
//!
//! The engine consumes catalogs through the [`CatalogSource`] seam. The
//! hosting API client itself lives outside this workspace; the shipped
//! source reads a JSON export file produced by such a client.

use serde::Deserialize;

use mirror_fs::NormalizedPath;

use crate::{RemoteRepo, Result};

/// Provider of remote repository catalogs.
///
/// Pagination and rate limiting belong to the implementation, not to the
/// engine: `fetch` returns the complete snapshot for one owner.
pub trait CatalogSource {
    /// Fetch all records for `owner`. An empty `owner` returns every record
    /// the source knows about.
    fn fetch(&self, owner: &str) -> Result<Vec<RemoteRepo>>;
}

/// Export files are either a bare array of records or wrapped in an object
/// with a `repositories` key.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    List(Vec<RemoteRepo>),
    Wrapped { repositories: Vec<RemoteRepo> },
}

/// Catalog backed by a JSON export file.
pub struct JsonCatalog {
    path: NormalizedPath,
}

impl JsonCatalog {
    pub fn new(path: impl Into<NormalizedPath>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }
}

impl CatalogSource for JsonCatalog {
    fn fetch(&self, owner: &str) -> Result<Vec<RemoteRepo>> {
        let file: CatalogFile = mirror_fs::read_json(&self.path)?;
        let records = match file {
            CatalogFile::List(records) => records,
            CatalogFile::Wrapped { repositories } => repositories,
        };

        let records: Vec<RemoteRepo> = if owner.is_empty() {
            records
        } else {
            records
                .into_iter()
                .filter(|r| r.owner.eq_ignore_ascii_case(owner))
                .collect()
        };

        tracing::debug!(
            catalog = %self.path,
            count = records.len(),
            "loaded catalog snapshot"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_catalog(dir: &tempfile::TempDir, body: &str) -> JsonCatalog {
        let path = dir.path().join("repos.json");
        std::fs::write(&path, body).unwrap();
        JsonCatalog::new(path)
    }

    #[test]
    fn test_fetch_bare_array() {
        let dir = tempfile::TempDir::new().unwrap();
        let catalog = write_catalog(
            &dir,
            r#"[
                {"owner": "octo", "name": "alpha"},
                {"owner": "octo", "name": "beta"}
            ]"#,
        );

        let records = catalog.fetch("octo").unwrap();
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_fetch_wrapped_object() {
        let dir = tempfile::TempDir::new().unwrap();
        let catalog = write_catalog(
            &dir,
            r#"{"repositories": [{"owner": "octo", "name": "alpha"}]}"#,
        );

        assert_eq!(catalog.fetch("").unwrap().len(), 1);
    }

    #[test]
    fn test_fetch_filters_by_owner() {
        let dir = tempfile::TempDir::new().unwrap();
        let catalog = write_catalog(
            &dir,
            r#"[
                {"owner": "octo", "name": "alpha"},
                {"owner": "hexa", "name": "gamma"}
            ]"#,
        );

        let records = catalog.fetch("OCTO").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "alpha");
        assert!(catalog.fetch("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_fetch_missing_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let catalog = JsonCatalog::new(dir.path().join("absent.json"));

        assert!(catalog.fetch("octo").is_err());
    }

    #[test]
    fn test_fetch_malformed_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let catalog = write_catalog(&dir, r#"{"count": 3}"#);

        assert!(catalog.fetch("octo").is_err());
    }
}
