//! The ordered, case-insensitively unique set of active filter terms.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::filter::pattern::TermPattern;
use crate::model::types::{fold_key, same_identifier};

/// Active filter terms in insertion order. Empty means "show everything".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActiveFilterSet {
    terms: Vec<String>,
}

impl ActiveFilterSet {
    /// Build from raw terms: trims, drops empty entries and case-insensitive
    /// duplicates (first occurrence wins).
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for term in terms {
            set.insert(term.as_ref());
        }
        set
    }

    /// Append `term` unless an equivalent one is active. Returns true when
    /// the set changed.
    pub fn insert(&mut self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() || self.contains(term) {
            return false;
        }
        self.terms.push(term.to_string());
        true
    }

    /// Remove the term equal to `term` ignoring case, returning the stored
    /// spelling.
    pub fn remove(&mut self, term: &str) -> Option<String> {
        let term = term.trim();
        let idx = self
            .terms
            .iter()
            .position(|existing| same_identifier(existing, term))?;
        Some(self.terms.remove(idx))
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.terms.is_empty();
        self.terms.clear();
        changed
    }

    pub fn contains(&self, term: &str) -> bool {
        let term = term.trim();
        self.terms
            .iter()
            .any(|existing| same_identifier(existing, term))
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Whether a row tagged with `identifier` stays visible: always when no
    /// term is active, otherwise when any term matches.
    pub fn allows(&self, identifier: &str) -> bool {
        if self.terms.is_empty() {
            return true;
        }
        let folded = fold_key(identifier);
        self.patterns().any(|pattern| pattern.matches_folded(&folded))
    }

    pub fn patterns(&self) -> impl Iterator<Item = TermPattern> + '_ {
        self.terms.iter().map(|term| TermPattern::parse(term))
    }

    /// Short human-readable list of the active terms; `None` means all rows
    /// are shown.
    pub fn summary(&self) -> Option<String> {
        if self.terms.is_empty() {
            None
        } else {
            Some(self.terms.iter().join(", "))
        }
    }

    /// Case-insensitive set equality, ignoring order.
    pub fn same_terms(&self, other: &Self) -> bool {
        self.len() == other.len() && self.terms.iter().all(|term| other.contains(term))
    }
}
