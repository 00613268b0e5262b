//! # HTTP Server Module
//!
//! Serves the admin contract over HTTP with a single Axum router.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/admin/*` - Admin actions for every registered resource

pub mod admin_routes;
pub mod config;
pub mod observability_routes;
pub mod server;

pub use admin_routes::{admin_routes, AdminState, CALLER_HEADER};
pub use config::HttpServerConfig;
pub use server::HttpServer;
