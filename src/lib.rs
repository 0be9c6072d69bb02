//! BetterCodex: repository filter for the Codex task list.
//!
//! The crate is the page-independent core of the browser extension. A host
//! adapter implements [`host::HostPage`] over the real page and drives a
//! [`controller::FilterController`] with [`controller::FilterMsg`]s.
//!
//! - **[`catalog`]**: every repository identifier seen on the page, sorted
//!   and unique ignoring case.
//! - **[`filter`]**: wildcard terms, the active set and row evaluation.
//! - **[`storage`]**: the persisted selection slot and its legacy formats.
//! - **[`controller`]**: per-route lifecycle, input and panel handling.
//! - **[`scheduler`]**: virtual-time delivery of delayed messages.

pub mod catalog;
pub mod config;
pub mod controller;
pub mod error;
pub mod filter;
pub mod host;
pub mod logging;
pub mod model;
pub mod scheduler;
pub mod storage;

pub use catalog::RepoCatalog;
pub use config::{ConfigError, FilterConfig};
pub use controller::{Cmd, FilterController, FilterMsg, FilterSession, FilterView, PanelState};
pub use error::FilterError;
pub use filter::{ActiveFilterSet, Evaluation, FilterEngine, TermChange, matches};
pub use host::{HostPage, Subscription, TaskRow};
pub use scheduler::Scheduler;
pub use storage::{FileStorage, FilterStorage, MemoryStorage};
