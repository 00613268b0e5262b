//! Audit events
//!
//! - Every mutation attempt is recorded with its outcome
//! - Each event carries: timestamp, action, resource, caller, affected ids, outcome
//! - The production sink writes to the `audit` tracing target

use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::Caller;
use crate::resource::RecordId;

/// Audited mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Destroy,
    BulkDestroy,
}

impl AuditAction {
    /// Returns the action name string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Destroy => "DESTROY",
            AuditAction::BulkDestroy => "BULK_DESTROY",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Audit event outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditOutcome {
    /// Mutation applied.
    Success,

    /// Refused by validation or authorization; nothing changed.
    Rejected,

    /// The store failed; nothing changed.
    Failed,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Success => "SUCCESS",
            AuditOutcome::Rejected => "REJECTED",
            AuditOutcome::Failed => "FAILED",
        }
    }
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single audit event.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub outcome: AuditOutcome,
    /// Singular resource name
    pub resource: String,
    pub caller: String,
    /// Affected primary keys, when known
    pub ids: Vec<RecordId>,
    /// Rows affected, for bulk actions
    pub count: Option<usize>,
    pub error: Option<String>,
}

impl AuditEvent {
    pub fn new(
        action: AuditAction,
        outcome: AuditOutcome,
        resource: impl Into<String>,
        caller: &Caller,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action,
            outcome,
            resource: resource.into(),
            caller: caller.to_string(),
            ids: Vec::new(),
            count: None,
            error: None,
        }
    }

    pub fn with_id(mut self, id: RecordId) -> Self {
        self.ids.push(id);
        self
    }

    pub fn with_ids(mut self, ids: &[RecordId]) -> Self {
        self.ids.extend_from_slice(ids);
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }
}

/// Destination for audit events
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent);
}

/// Writes audit events to the `audit` tracing target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuditEvent) {
        let ids = if event.ids.len() > 20 {
            format!("{} ids", event.ids.len())
        } else {
            format!("{:?}", event.ids)
        };
        match event.outcome {
            AuditOutcome::Success => tracing::info!(
                target: "audit",
                event_id = %event.id,
                action = %event.action,
                outcome = %event.outcome,
                resource = %event.resource,
                caller = %event.caller,
                ids = %ids,
                count = ?event.count
            ),
            AuditOutcome::Rejected | AuditOutcome::Failed => tracing::warn!(
                target: "audit",
                event_id = %event.id,
                action = %event.action,
                outcome = %event.outcome,
                resource = %event.resource,
                caller = %event.caller,
                ids = %ids,
                error = ?event.error
            ),
        }
    }
}

/// In-memory audit sink for testing.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, oldest first
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: &AuditEvent) {
        let mut events = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        events.push(event.clone());
    }
}
