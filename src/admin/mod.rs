//! # Admin Module
//!
//! The uniform admin contract every resource follows: list, create form,
//! store, show, edit form, update, destroy and bulk destroy.
//!
//! # Architecture
//!
//! ```text
//! HTTP route → ResourceController → AdminService → PermissionService
//!                     │                  │       → FormRequest (validation)
//!                     │                  │       → Store / Transaction
//!                     │                  └──────→ AuditSink
//!                     └─→ payload shaping (page or programmatic)
//! ```

pub mod controller;
pub mod errors;
pub mod payload;
pub mod service;
pub mod view;

pub use controller::ResourceController;
pub use errors::{AdminError, AdminResult, ErrorResponse};
pub use payload::{Location, Payload, RequestMode, ViewModel, OPERATION_SUCCEEDED};
pub use service::{AdminService, BulkOutcome, DEFAULT_BATCH_SIZE};
pub use view::{JsonViewRenderer, RenderedView, ViewRenderer};
