//! Shared fixtures for integration tests
//!
//! `Fixture` wires the real resource catalog to an in-memory store, a
//! grant table and a recording audit sink. `FailingStore` wraps a store
//! and fails a chosen bulk batch.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Map, Value};

use transitadmin::admin::AdminService;
use transitadmin::auth::{Caller, GrantTable, OwnershipPolicy};
use transitadmin::listing::{ListOutcome, ListQuery};
use transitadmin::observability::MemoryAuditSink;
use transitadmin::resource::{Record, RecordId, ResourceDescriptor, ResourceRegistry};
use transitadmin::resources;
use transitadmin::store::{Deletion, MemoryStore, Store, StoreError, StoreResult, Transaction};

pub const ROOT: &str = "root";
pub const CLERK: &str = "clerk";

pub fn root() -> Caller {
    Caller::user(ROOT)
}

pub fn clerk() -> Caller {
    Caller::user(CLERK)
}

/// `root` holds every permission; `clerk` may only list and show
pub fn grants() -> GrantTable {
    GrantTable::new()
        .grant(ROOT, "admin.*")
        .and_then(|t| t.grant(CLERK, "admin.ticket.index"))
        .and_then(|t| t.grant(CLERK, "admin.ticket.show"))
        .and_then(|t| t.grant(CLERK, "admin.schedule.index"))
        .unwrap()
}

pub struct Fixture {
    pub registry: Arc<ResourceRegistry>,
    pub store: Arc<dyn Store>,
    pub audit: MemoryAuditSink,
    pub service: AdminService,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn Store>) -> Self {
        let registry = Arc::new(resources::catalog().unwrap());
        let audit = MemoryAuditSink::new();
        let permissions = OwnershipPolicy::new(grants(), &registry);
        let service = AdminService::new(
            Arc::clone(&registry),
            Arc::clone(&store),
            Arc::new(permissions),
        )
        .with_audit(Arc::new(audit.clone()));
        Self {
            registry,
            store,
            audit,
            service,
        }
    }

    pub fn descriptor(&self, name: &str) -> Arc<ResourceDescriptor> {
        Arc::clone(self.registry.get(name).unwrap())
    }

    pub fn insert(&self, resource: &str, values: Value) -> Record {
        let values: Map<String, Value> = values.as_object().cloned().unwrap();
        self.store.insert(resource, values).unwrap()
    }

    /// One transport, route, passenger and schedule; returns the schedule id
    pub fn seed_schedule(&self) -> RecordId {
        let transport = self.insert("transport", json!({"name": "Bus 7", "seats": 40}));
        let route = self.insert("route", json!({"departure": "Riga", "arrival": "Cesis"}));
        self.insert("passenger", json!({"name": "Anna", "surname": "Berzina"}));
        self.insert(
            "schedule",
            json!({
                "date": "2026-10-14",
                "time": "08:30:00",
                "cost": 4.5,
                "confirmed": true,
                "transport_id": transport.id(),
                "route_id": route.id(),
                "deleted": false
            }),
        )
        .id()
    }

    /// `count` tickets for passenger 1 on `schedule`, ids 1..=count
    pub fn seed_tickets(&self, schedule: RecordId, count: usize) -> Vec<RecordId> {
        (0..count)
            .map(|_| {
                self.insert(
                    "ticket",
                    json!({"passenger_id": 1, "schedule_id": schedule, "deleted": false}),
                )
                .id()
            })
            .collect()
    }

    /// How many of `ids` still have a row, marked or not
    pub fn remaining(&self, resource: &str, ids: &[RecordId]) -> usize {
        self.store.find_many(resource, ids).unwrap().len()
    }
}

pub fn bulk_body(ids: &[RecordId]) -> Value {
    json!({"data": {"ids": ids}})
}

/// Delegates to an inner store; the `fail_on`-th bulk batch (1-based) fails
pub struct FailingStore {
    inner: MemoryStore,
    fail_on: Option<usize>,
    batches: Arc<AtomicUsize>,
}

impl FailingStore {
    pub fn new(fail_on: Option<usize>) -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_on,
            batches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Batches attempted so far, including a failed one
    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }
}

impl Store for FailingStore {
    fn list(&self, resource: &str, query: &ListQuery) -> StoreResult<ListOutcome> {
        self.inner.list(resource, query)
    }

    fn find(&self, resource: &str, id: RecordId) -> StoreResult<Option<Record>> {
        self.inner.find(resource, id)
    }

    fn find_many(&self, resource: &str, ids: &[RecordId]) -> StoreResult<Vec<Record>> {
        self.inner.find_many(resource, ids)
    }

    fn find_by(&self, resource: &str, field: &str, value: &Value) -> StoreResult<Vec<Record>> {
        self.inner.find_by(resource, field, value)
    }

    fn insert(&self, resource: &str, values: Map<String, Value>) -> StoreResult<Record> {
        self.inner.insert(resource, values)
    }

    fn update(
        &self,
        resource: &str,
        id: RecordId,
        changes: Map<String, Value>,
    ) -> StoreResult<Record> {
        self.inner.update(resource, id, changes)
    }

    fn delete(&self, resource: &str, id: RecordId, deletion: Deletion<'_>) -> StoreResult<bool> {
        self.inner.delete(resource, id, deletion)
    }

    fn begin(&self) -> StoreResult<Box<dyn Transaction + '_>> {
        Ok(Box::new(FailingTransaction {
            inner: self.inner.begin()?,
            fail_on: self.fail_on,
            batches: Arc::clone(&self.batches),
        }))
    }
}

struct FailingTransaction<'a> {
    inner: Box<dyn Transaction + 'a>,
    fail_on: Option<usize>,
    batches: Arc<AtomicUsize>,
}

impl Transaction for FailingTransaction<'_> {
    fn delete_batch(
        &mut self,
        resource: &str,
        ids: &[RecordId],
        deletion: Deletion<'_>,
    ) -> StoreResult<usize> {
        let batch = self.batches.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on == Some(batch) {
            return Err(StoreError::Backend(format!("injected failure on batch {}", batch)));
        }
        self.inner.delete_batch(resource, ids, deletion)
    }

    fn commit(self: Box<Self>) -> StoreResult<()> {
        self.inner.commit()
    }

    fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.inner.rollback()
    }
}
