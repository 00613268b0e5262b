//! Observability subsystem
//!
//! This module provides:
//! - Structured logging through `tracing`, initialized once by the binary
//! - Audit events for every admin mutation
//!
//! # Usage
//!
//! ```ignore
//! use transitadmin::observability::{logging, AuditEvent, AuditSink, TracingAuditSink};
//!
//! logging::init("info", logging::LogMode::Json)?;
//!
//! let sink = TracingAuditSink;
//! sink.record(&AuditEvent::new(AuditAction::Create, AuditOutcome::Success, "ticket", &caller));
//! ```

pub mod audit;
pub mod logging;

pub use audit::{AuditAction, AuditEvent, AuditOutcome, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use logging::{LogMode, LoggingError};
