//! Filter engine: owns the active terms, applies them to rows and keeps the
//! storage slot in sync.
//!
//! Every mutation persists immediately. Persistence is best-effort: a failed
//! write is logged and the in-memory selection keeps filtering for the rest of
//! the session.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::RepoCatalog;
use crate::filter::active::ActiveFilterSet;
use crate::filter::pattern::is_wildcard;
use crate::host::TaskRow;
use crate::model::types::same_identifier;
use crate::storage::{FilterStorage, decode_terms, encode_terms};

/// Outcome of a term mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermChange {
    /// The resolved term was appended.
    Added(String),
    /// The stored term was removed.
    Removed(String),
    /// An equivalent term is already active (stored spelling).
    Duplicate(String),
    /// Nothing to remove.
    Missing,
    /// Blank input.
    Ignored,
}

impl TermChange {
    pub fn changed(&self) -> bool {
        matches!(self, Self::Added(_) | Self::Removed(_))
    }
}

/// Counters from one pass over the rendered rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub shown: usize,
    pub hidden: usize,
    /// Rows without a repository label; always shown.
    pub unlabeled: usize,
    /// Identifiers added to the catalog during the pass.
    pub discovered: usize,
}

impl Evaluation {
    pub fn rows(&self) -> usize {
        self.shown + self.hidden
    }
}

pub struct FilterEngine {
    active: ActiveFilterSet,
    storage: Arc<dyn FilterStorage>,
    storage_key: String,
}

impl std::fmt::Debug for FilterEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterEngine")
            .field("active", &self.active)
            .field("storage_key", &self.storage_key)
            .finish_non_exhaustive()
    }
}

impl FilterEngine {
    /// Create an engine with an empty selection. Call [`Self::restore`] to
    /// load the saved one.
    pub fn new(storage: Arc<dyn FilterStorage>, storage_key: impl Into<String>) -> Self {
        Self {
            active: ActiveFilterSet::default(),
            storage,
            storage_key: storage_key.into(),
        }
    }

    pub fn active(&self) -> &ActiveFilterSet {
        &self.active
    }

    pub fn terms(&self) -> &[String] {
        self.active.terms()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn summary(&self) -> Option<String> {
        self.active.summary()
    }

    /// Map user text to the term that will be stored.
    ///
    /// Exact catalog matches take the catalog's casing. Plain text that is a
    /// substring of exactly one known repository becomes that repository.
    /// Anything else (wildcards, unknown repositories) is kept as typed.
    pub fn resolve_term(raw: &str, catalog: &RepoCatalog) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Some(known) = catalog.find_case_insensitive(raw) {
            return Some(known.to_string());
        }
        if !is_wildcard(raw) {
            let candidates = catalog.search(raw);
            if let [only] = candidates.as_slice() {
                return Some((*only).to_string());
            }
        }
        Some(raw.to_string())
    }

    pub fn add_term(&mut self, raw: &str, catalog: &RepoCatalog) -> TermChange {
        let Some(term) = Self::resolve_term(raw, catalog) else {
            return TermChange::Ignored;
        };
        if let Some(existing) = self
            .active
            .terms()
            .iter()
            .find(|existing| same_identifier(existing, &term))
        {
            return TermChange::Duplicate(existing.clone());
        }
        self.active.insert(&term);
        self.persist();
        info!(term = %term, active = self.active.len(), "filter term added");
        TermChange::Added(term)
    }

    pub fn remove_term(&mut self, term: &str) -> TermChange {
        match self.active.remove(term) {
            Some(removed) => {
                self.persist();
                info!(term = %removed, active = self.active.len(), "filter term removed");
                TermChange::Removed(removed)
            }
            None => TermChange::Missing,
        }
    }

    /// Drop every active term. Returns false when nothing was active.
    pub fn clear(&mut self) -> bool {
        if !self.active.clear() {
            return false;
        }
        self.persist();
        info!("filter cleared");
        true
    }

    /// Apply the selection to one row and record its repository in the
    /// catalog.
    pub fn apply_to_row<R>(&self, row: &mut R, catalog: &mut RepoCatalog, tally: &mut Evaluation)
    where
        R: TaskRow + ?Sized,
    {
        let Some(repository) = row.repository() else {
            row.set_visible(true);
            tally.unlabeled += 1;
            tally.shown += 1;
            return;
        };
        if catalog.observe_one(&repository) {
            tally.discovered += 1;
        }
        let visible = self.active.allows(&repository);
        row.set_visible(visible);
        if visible {
            tally.shown += 1;
        } else {
            tally.hidden += 1;
        }
    }

    /// Apply the selection to every row. With no active terms every row is
    /// shown.
    pub fn evaluate<'r, R, I>(&self, rows: I, catalog: &mut RepoCatalog) -> Evaluation
    where
        R: TaskRow + ?Sized + 'r,
        I: IntoIterator<Item = &'r mut R>,
    {
        let mut tally = Evaluation::default();
        for row in rows {
            self.apply_to_row(row, catalog, &mut tally);
        }
        debug!(
            shown = tally.shown,
            hidden = tally.hidden,
            unlabeled = tally.unlabeled,
            discovered = tally.discovered,
            "filter applied"
        );
        tally
    }

    /// Record a row's repository without touching its visibility. Returns
    /// true when the catalog grew.
    pub fn discover_row<R>(row: &R, catalog: &mut RepoCatalog) -> bool
    where
        R: TaskRow + ?Sized,
    {
        row.repository()
            .is_some_and(|repository| catalog.observe_one(&repository))
    }

    /// Discovery-only pass over `rows`. Returns how many identifiers were new.
    pub fn discover<'r, R, I>(rows: I, catalog: &mut RepoCatalog) -> usize
    where
        R: TaskRow + ?Sized + 'r,
        I: IntoIterator<Item = &'r mut R>,
    {
        rows.into_iter()
            .filter(|row| Self::discover_row(&**row, catalog))
            .count()
    }

    /// Write the selection to the storage slot. Failures are logged and
    /// reported as `false`.
    pub fn persist(&self) -> bool {
        let payload = encode_terms(&self.active);
        match self.storage.set(&self.storage_key, &payload) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, key = %self.storage_key, "failed to persist filter, keeping it in memory");
                false
            }
        }
    }

    /// Replace the selection with the saved one and write it back in the
    /// current format. Returns the number of restored terms.
    ///
    /// Terms are matched against the catalog exactly (ignoring case) so the
    /// restored set equals the persisted one.
    pub fn restore(&mut self, catalog: &RepoCatalog) -> usize {
        let raw = match self.storage.get(&self.storage_key) {
            Ok(raw) => raw,
            Err(e) => {
                // Slot left untouched.
                warn!(error = %e, key = %self.storage_key, "failed to read saved filter");
                self.active = ActiveFilterSet::default();
                return 0;
            }
        };
        let saved = match decode_terms(raw.as_deref()) {
            Ok(terms) => terms,
            Err(e) => {
                debug!(error = %e, "ignoring malformed saved filter");
                Vec::new()
            }
        };

        let mut restored = ActiveFilterSet::default();
        for term in saved {
            match catalog.find_case_insensitive(&term) {
                Some(known) => restored.insert(known),
                None => restored.insert(&term),
            };
        }
        self.active = restored;
        self.persist();
        info!(terms = ?self.active.terms(), "loaded saved filter");
        self.active.len()
    }
}
