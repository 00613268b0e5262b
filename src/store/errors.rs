//! Backing store errors

use thiserror::Error;

use crate::resource::RecordId;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Backing store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A lock was poisoned by a panicking writer
    #[error("store lock poisoned")]
    Poisoned,

    /// No row with this primary key
    #[error("{resource} {id} not found")]
    NotFound { resource: String, id: RecordId },

    /// Any failure reported by the storage engine
    #[error("backend error: {0}")]
    Backend(String),
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        StoreError::Poisoned
    }
}
