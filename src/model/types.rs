//! Repository identifiers and the payload shapes they arrive in.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::error::FilterError;

/// Case-folded key used for identifier equality.
///
/// Two identifiers are the same repository when their folded keys are equal.
pub fn fold_key(identifier: &str) -> String {
    identifier.to_lowercase()
}

/// Case-insensitive identifier equality.
pub fn same_identifier(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || fold_key(a) == fold_key(b)
}

/// Primary collation key: canonical decomposition with combining marks
/// dropped, then lowercased. `Ärger` and `arger` share a primary key.
pub fn collation_key(identifier: &str) -> String {
    identifier
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Locale-aware ordering for catalog entries.
///
/// Compares primary collation keys first; ties fall back to the raw strings
/// so the order is total.
pub fn compare_identifiers(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

/// Repository list payload returned by the host application's environment API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryListing {
    #[serde(default)]
    pub repositories: Vec<RepositoryEntry>,
}

/// One repository in a [`RepositoryListing`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryEntry {
    #[serde(default)]
    pub repository_full_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl RepositoryEntry {
    /// Display identifier: the full `owner/name` when present, else the bare name.
    pub fn identifier(&self) -> Option<&str> {
        self.repository_full_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.name.as_deref().filter(|s| !s.trim().is_empty()))
    }
}

impl RepositoryListing {
    /// Parse a raw payload body.
    pub fn from_json(payload: &str) -> Result<Self, FilterError> {
        serde_json::from_str(payload).map_err(|e| FilterError::MalformedPayload(e.to_string()))
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.repositories.iter().filter_map(RepositoryEntry::identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_identifier_ignores_case() {
        assert!(same_identifier("Acme/Widgets", "acme/widgets"));
        assert!(same_identifier("ÄRGER/x", "ärger/x"));
        assert!(!same_identifier("acme/widgets", "acme/widget"));
    }

    #[test]
    fn collation_strips_diacritics_and_case() {
        assert_eq!(collation_key("Ärger/Repo"), "arger/repo");
        assert_eq!(collation_key("café/app"), "cafe/app");
    }

    #[test]
    fn compare_orders_case_insensitively_first() {
        let mut names = vec!["beta/x", "Alpha/y", "alpha/b", "Ärmel/z", "zeta/q"];
        names.sort_by(|a, b| compare_identifiers(a, b));
        assert_eq!(names, vec!["alpha/b", "Alpha/y", "Ärmel/z", "beta/x", "zeta/q"]);
    }

    #[test]
    fn compare_is_total_on_case_variants() {
        assert_eq!(compare_identifiers("a/B", "a/b"), Ordering::Less);
        assert_eq!(compare_identifiers("a/b", "a/b"), Ordering::Equal);
    }

    #[test]
    fn listing_prefers_full_name() {
        let listing: RepositoryListing = serde_json::from_str(
            r#"{"repositories":[
                {"repository_full_name":"acme/widgets","name":"widgets"},
                {"name":"solo"},
                {"repository_full_name":"  ","name":"fallback"},
                {}
            ]}"#,
        )
        .expect("parse listing");
        let ids: Vec<&str> = listing.identifiers().collect();
        assert_eq!(ids, vec!["acme/widgets", "solo", "fallback"]);
    }

    #[test]
    fn from_json_reports_malformed_payloads() {
        let listing = RepositoryListing::from_json("{}").expect("empty object");
        assert!(listing.repositories.is_empty());
        assert!(matches!(
            RepositoryListing::from_json("\"not a listing\""),
            Err(FilterError::MalformedPayload(_))
        ));
    }
}
