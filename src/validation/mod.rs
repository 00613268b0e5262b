//! # Request Validation
//!
//! Declarative rule sets checked against raw request bodies before any
//! permission check or persistence call.

pub mod errors;
pub mod request;
pub mod rules;

pub use errors::{ValidationErrors, ValidationResult};
pub use request::{BulkDestroyRequest, ExistenceCheck, FormError, FormRequest, KeepInput, Sanitizer};
pub use rules::{FieldRules, Rule, RuleSet};
