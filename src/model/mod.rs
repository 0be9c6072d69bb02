//! Data model shared by the catalog, the filter engine and the host adapters.

pub mod types;

pub use types::{RepositoryEntry, RepositoryListing, compare_identifiers, fold_key};
