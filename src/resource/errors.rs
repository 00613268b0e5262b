//! Resource declaration errors
//!
//! These are raised while building descriptors and the registry, never
//! while serving requests.

use thiserror::Error;

/// Result type for resource declarations
pub type ResourceResult<T> = Result<T, ResourceError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// A column list names a field that was never declared
    #[error("resource '{resource}': unknown column '{column}'")]
    UnknownColumn { resource: String, column: String },

    /// A field was declared twice
    #[error("resource '{resource}': field '{field}' declared twice")]
    DuplicateField { resource: String, field: String },

    /// Searchable columns must also be listable
    #[error("resource '{resource}': searchable column '{column}' is not listable")]
    SearchableNotListable { resource: String, column: String },

    /// Primary key and soft-delete marker are system-managed
    #[error("resource '{resource}': system field '{field}' cannot be fillable")]
    SystemFieldFillable { resource: String, field: String },

    /// Validation rules for a field that is not fillable
    #[error("resource '{resource}': rules declared for non-fillable field '{field}'")]
    RuleForNonFillable { resource: String, field: String },

    /// Soft delete policy without a marker column
    #[error("resource '{resource}': soft delete requires a soft-delete field")]
    MissingSoftDeleteField { resource: String },

    /// A marker that hides rows listed as a column
    #[error("resource '{resource}': marker '{field}' hides rows and cannot be listable")]
    HiddenMarkerListable { resource: String, field: String },

    /// Relation or `exists` rule pointing at an unregistered resource
    #[error("resource '{resource}': relation '{relation}' targets unknown resource '{target}'")]
    UnknownRelationTarget {
        resource: String,
        relation: String,
        target: String,
    },

    /// A pattern rule that does not compile
    #[error("resource '{resource}': invalid pattern for '{field}': {reason}")]
    InvalidPattern {
        resource: String,
        field: String,
        reason: String,
    },

    /// Resource registered twice (by name or plural)
    #[error("resource '{0}' is already registered")]
    DuplicateResource(String),

    /// Lookup of an unregistered resource
    #[error("unknown resource '{0}'")]
    UnknownResource(String),
}
