//! # Auth Module
//!
//! Authorization for the admin surface: caller identity, named
//! permissions, and the permission services that answer them. Callers are
//! authenticated upstream; this module only decides what they may do.

pub mod caller;
pub mod errors;
pub mod grants;
pub mod ownership;
pub mod permission;

pub use caller::Caller;
pub use errors::{AuthError, AuthResult};
pub use grants::GrantTable;
pub use ownership::OwnershipPolicy;
pub use permission::{Ability, Permission, PermissionService};
