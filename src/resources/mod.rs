//! # Resource Catalog
//!
//! The concrete entities served under `/admin`. Each file declares one
//! descriptor; `catalog()` registers them all and checks cross-references.
//!
//! ```text
//! city ◄── office
//! transport ◄── schedule ──► route
//!                  ▲
//! passenger ◄── ticket
//! ```

mod city;
mod office;
mod passenger;
mod route;
mod schedule;
mod sanitize;
mod ticket;
mod transport;

pub use sanitize::TrimText;

use crate::resource::{ResourceRegistry, ResourceResult};

/// Every served resource, verified
pub fn catalog() -> ResourceResult<ResourceRegistry> {
    let mut registry = ResourceRegistry::new();
    registry.register(city::descriptor()?)?;
    registry.register(office::descriptor()?)?;
    registry.register(passenger::descriptor()?)?;
    registry.register(transport::descriptor()?)?;
    registry.register(route::descriptor()?)?;
    registry.register(schedule::descriptor()?)?;
    registry.register(ticket::descriptor()?)?;
    registry.verify()?;
    Ok(registry)
}
