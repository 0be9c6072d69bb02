//! Filter term matching.
//!
//! A term is free text with an optional leading and/or trailing `*`:
//!
//! | Term        | Pattern              | Matches `acme/widgets` |
//! |-------------|----------------------|------------------------|
//! | `widg`      | contains `widg`      | yes                    |
//! | `*widg*`    | contains `widg`      | yes                    |
//! | `acme/*`    | starts with `acme/`  | yes                    |
//! | `*/widgets` | ends with `/widgets` | yes                    |
//! | `*`, `**`   | anything             | yes                    |
//!
//! All comparisons are case-insensitive.

use crate::model::types::fold_key;

/// Parsed form of a filter term. The stored core is already case-folded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermPattern {
    Any,
    Contains(String),
    Prefix(String),
    Suffix(String),
}

impl TermPattern {
    pub fn parse(term: &str) -> Self {
        let folded = fold_key(term.trim());
        let (leading, rest) = match folded.strip_prefix('*') {
            Some(rest) => (true, rest),
            None => (false, folded.as_str()),
        };
        let (trailing, core) = match rest.strip_suffix('*') {
            Some(core) => (true, core),
            None => (false, rest),
        };
        if core.is_empty() {
            return Self::Any;
        }
        let core = core.to_string();
        match (leading, trailing) {
            (true, false) => Self::Suffix(core),
            (false, true) => Self::Prefix(core),
            _ => Self::Contains(core),
        }
    }

    /// Test an identifier that has already been passed through [`fold_key`].
    pub fn matches_folded(&self, folded_identifier: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Contains(core) => folded_identifier.contains(core.as_str()),
            Self::Prefix(core) => folded_identifier.starts_with(core.as_str()),
            Self::Suffix(core) => folded_identifier.ends_with(core.as_str()),
        }
    }

    pub fn matches(&self, identifier: &str) -> bool {
        self.matches_folded(&fold_key(identifier))
    }
}

/// Whether `term` selects the repository `identifier`.
pub fn matches(identifier: &str, term: &str) -> bool {
    TermPattern::parse(term).matches(identifier)
}

/// Whether `raw` uses wildcard syntax.
pub fn is_wildcard(raw: &str) -> bool {
    raw.contains('*')
}
