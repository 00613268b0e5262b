//! transitadmin - admin back office for a passenger-transit operator
//!
//! Every resource (tickets, schedules, offices and their lookups) is served
//! through one contract: paginated listing with filters and search, create
//! and edit forms, store, show, update, destroy and chunked bulk destroy.

pub mod admin;
pub mod auth;
pub mod cli;
pub mod config;
pub mod http_server;
pub mod listing;
pub mod observability;
pub mod resource;
pub mod resources;
pub mod store;
pub mod validation;
