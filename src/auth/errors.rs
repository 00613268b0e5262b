//! # Auth Errors
//!
//! Error types for permission names and grant tables.

use thiserror::Error;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authorization configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Not of the form `admin.<resource>.<ability>`
    #[error("Invalid permission name: {0}")]
    InvalidPermission(String),

    /// A grant pattern with a `*` anywhere but the end
    #[error("Invalid grant pattern for {caller}: {pattern}")]
    InvalidGrant { caller: String, pattern: String },

    /// Empty caller id in a grant table
    #[error("Grant table contains an empty caller id")]
    EmptyCaller,
}
