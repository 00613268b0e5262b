//! # Resource Model
//!
//! Declarative descriptions of the entities served by the admin surface.
//! Each concrete resource is configuration: a field list, column roles,
//! relations, rules, and policies.

pub mod descriptor;
pub mod errors;
pub mod field;
pub mod record;
pub mod registry;
pub mod relation;

pub use descriptor::{BulkAuthorization, DeleteMode, DeletePolicy, ResourceBuilder, ResourceDescriptor};
pub use errors::{ResourceError, ResourceResult};
pub use field::{FieldDef, FieldType};
pub use record::{Record, RecordId, PRIMARY_KEY};
pub use registry::ResourceRegistry;
pub use relation::{Cardinality, Relation};
