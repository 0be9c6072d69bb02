//! Error types for the repository filter.
//!
//! Nothing in this crate is allowed to break the host page. Every variant here
//! is recovered at the point it is raised: the controller logs it and either
//! skips the current cycle or keeps working with in-memory state.

use thiserror::Error;

/// Errors raised while talking to the host page, the storage slot, or an
/// intercepted API payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// An expected anchor on the host page is not rendered yet.
    #[error("host element not found: {0}")]
    NotFound(&'static str),

    /// The storage slot holds something that is not a term list.
    #[error("malformed persisted filter state: {0}")]
    MalformedPersistedState(String),

    /// The storage slot could not be read.
    #[error("failed to read filter storage: {0}")]
    StorageRead(String),

    /// The storage slot could not be written (quota, permissions).
    #[error("failed to write filter storage: {0}")]
    StorageWrite(String),

    /// An intercepted repository payload could not be parsed.
    #[error("malformed repository payload: {0}")]
    MalformedPayload(String),
}

impl FilterError {
    /// Whether the failure only affects persistence; filtering itself keeps
    /// working when this returns true.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::StorageRead(_) | Self::StorageWrite(_))
    }
}
