//! Remote catalog data model for Mirror Manager
//!
//! A catalog is the full set of remote repository records for one owner,
//! fetched once per run and treated as an immutable snapshot. This crate
//! owns the record type, the [`CatalogSource`] seam the engine consumes
//! catalogs through, the on-disk mirror layout, and aggregate catalog
//! statistics. It knows nothing about git operations.

pub mod catalog;
pub mod error;
pub mod layout;
pub mod record;
pub mod summary;

pub use catalog::{CatalogSource, JsonCatalog};
pub use error::{Error, Result};
pub use layout::MirrorLayout;
pub use record::{RemoteRepo, Transport};
pub use summary::CatalogSummary;
