//! Repository filtering.
//!
//! - **[`pattern`]**: term parsing and wildcard matching.
//! - **[`active`]**: the active term set and its union semantics.
//! - **[`engine`]**: term resolution against the catalog, row evaluation,
//!   persistence and restore.

pub mod active;
pub mod engine;
pub mod pattern;

pub use active::ActiveFilterSet;
pub use engine::{Evaluation, FilterEngine, TermChange};
pub use pattern::{TermPattern, matches};
