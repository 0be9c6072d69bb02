//! Repository catalog: every repository identifier seen so far on the page.
//!
//! The catalog is fed from three places:
//!
//! - **Selector widget**: a one-time scan of the host's repository picker via
//!   [`RepoCatalog::bulk_seed`]. The picker mixes real repositories with
//!   section headers and "Configure…" entries, so the configured exclusion
//!   lists apply here.
//! - **API payload**: an intercepted environment listing via
//!   [`RepoCatalog::seed_from_api`].
//! - **Task rows**: identifiers discovered while evaluating rows via
//!   [`RepoCatalog::observe_one`]. Rows only ever carry real `owner/name`
//!   identifiers, so no exclusion lists apply.
//!
//! Entries are unique by folded key (first-seen casing wins) and kept in
//! locale-aware order. The catalog never shrinks during a session.

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::config::FilterConfig;
use crate::error::FilterError;
use crate::filter::active::ActiveFilterSet;
use crate::model::types::{RepositoryListing, compare_identifiers, fold_key};

#[derive(Debug, Clone)]
pub struct RepoCatalog {
    entries: Vec<String>,
    keys: FxHashSet<String>,
    ignored_exact: Vec<String>,
    ignored_partial: Vec<String>,
}

impl Default for RepoCatalog {
    fn default() -> Self {
        Self::new(&FilterConfig::default())
    }
}

impl RepoCatalog {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            entries: Vec::new(),
            keys: FxHashSet::default(),
            ignored_exact: config
                .ignored_exact_labels
                .iter()
                .map(|label| fold_key(label.trim()))
                .collect(),
            ignored_partial: config
                .ignored_partial_labels
                .iter()
                .map(|label| fold_key(label.trim()))
                .filter(|label| !label.is_empty())
                .collect(),
        }
    }

    /// Seed from selector-widget labels. Returns how many names were added.
    pub fn bulk_seed<I, S>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() || self.is_ignored_label(name) {
                continue;
            }
            if self.push_unsorted(name) {
                added += 1;
            }
        }
        self.sort();
        debug!(added, total = self.entries.len(), "catalog seeded from selector");
        added
    }

    /// Add names that are known to be real repositories (API payloads).
    pub fn extend_discovered<I, S>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for name in names {
            let name = name.as_ref().trim();
            if !name.is_empty() && self.push_unsorted(name) {
                added += 1;
            }
        }
        if added > 0 {
            self.sort();
        }
        added
    }

    /// Parse an intercepted `{ "repositories": [...] }` payload and add its
    /// identifiers.
    pub fn seed_from_api(&mut self, payload: &str) -> Result<usize, FilterError> {
        let listing = RepositoryListing::from_json(payload)?;
        let added = self.extend_discovered(listing.identifiers());
        debug!(added, total = self.entries.len(), "catalog seeded from api payload");
        Ok(added)
    }

    /// Record one identifier discovered on a rendered row. Returns true when
    /// the catalog grew.
    pub fn observe_one(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || !self.keys.insert(fold_key(name)) {
            return false;
        }
        let idx = self
            .entries
            .binary_search_by(|entry| compare_identifiers(entry, name))
            .unwrap_or_else(|idx| idx);
        self.entries.insert(idx, name.to_string());
        debug!(repository = name, total = self.entries.len(), "catalog discovered repository");
        true
    }

    /// Exact case-insensitive lookup returning the stored casing.
    pub fn find_case_insensitive(&self, name: &str) -> Option<&str> {
        let key = fold_key(name.trim());
        if !self.keys.contains(&key) {
            return None;
        }
        self.entries
            .iter()
            .find(|entry| fold_key(entry) == key)
            .map(String::as_str)
    }

    /// Case-insensitive substring search in catalog order. An empty query
    /// returns every entry.
    pub fn search(&self, substring: &str) -> Vec<&str> {
        let needle = fold_key(substring.trim());
        self.entries
            .iter()
            .filter(|entry| needle.is_empty() || fold_key(entry).contains(&needle))
            .map(String::as_str)
            .collect()
    }

    /// Suggestion list for `query`, leaving out identifiers that are already
    /// active filter terms.
    pub fn suggestions(&self, query: &str, active: &ActiveFilterSet) -> Vec<String> {
        self.search(query)
            .into_iter()
            .filter(|entry| !active.contains(entry))
            .map(str::to_string)
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.keys.contains(&fold_key(name.trim()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    fn is_ignored_label(&self, name: &str) -> bool {
        let folded = fold_key(name);
        self.ignored_exact.iter().any(|label| *label == folded)
            || self
                .ignored_partial
                .iter()
                .any(|partial| folded.contains(partial.as_str()))
    }

    fn push_unsorted(&mut self, name: &str) -> bool {
        if !self.keys.insert(fold_key(name)) {
            return false;
        }
        self.entries.push(name.to_string());
        true
    }

    fn sort(&mut self) {
        self.entries.sort_by(|a, b| compare_identifiers(a, b));
    }
}
