//! # Backing Store
//!
//! The persistence seam of the admin surface. `Store` answers listing
//! queries and single-row writes; `Transaction` carries the batched
//! deletes of a bulk destroy so they commit or roll back together.
//!
//! `MemoryStore` is the in-process implementation used by the binary and
//! the tests.

mod errors;
mod memory;

pub use errors::{StoreError, StoreResult};
pub use memory::MemoryStore;

use serde_json::{Map, Value};

use crate::listing::{ListOutcome, ListQuery};
use crate::resource::{DeleteMode, Record, RecordId};
use crate::validation::ExistenceCheck;

/// What a delete does to a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion<'a> {
    /// Remove the row
    Remove,
    /// Set this boolean marker column
    Mark(&'a str),
}

impl<'a> Deletion<'a> {
    /// Soft delete without a marker column falls back to removal
    pub fn new(mode: DeleteMode, marker: Option<&'a str>) -> Self {
        match (mode, marker) {
            (DeleteMode::Soft, Some(marker)) => Deletion::Mark(marker),
            _ => Deletion::Remove,
        }
    }
}

/// Row storage for every resource, keyed by resource name
pub trait Store: Send + Sync {
    /// Run a listing query
    fn list(&self, resource: &str, query: &ListQuery) -> StoreResult<ListOutcome>;

    fn find(&self, resource: &str, id: RecordId) -> StoreResult<Option<Record>>;

    /// Rows for the given keys, in key order. Missing keys are skipped.
    fn find_many(&self, resource: &str, ids: &[RecordId]) -> StoreResult<Vec<Record>>;

    /// Rows whose `field` equals `value`, in key order
    fn find_by(&self, resource: &str, field: &str, value: &Value) -> StoreResult<Vec<Record>>;

    /// Insert a row and assign its primary key
    fn insert(&self, resource: &str, values: Map<String, Value>) -> StoreResult<Record>;

    /// Merge `changes` into an existing row
    fn update(
        &self,
        resource: &str,
        id: RecordId,
        changes: Map<String, Value>,
    ) -> StoreResult<Record>;

    /// Delete one row. Returns false if there was no such row.
    fn delete(&self, resource: &str, id: RecordId, deletion: Deletion<'_>) -> StoreResult<bool>;

    /// Open a transaction. Writers are excluded until it ends.
    fn begin(&self) -> StoreResult<Box<dyn Transaction + '_>>;
}

/// A unit of work spanning several batch deletes
pub trait Transaction {
    /// Delete the rows with these keys. Missing keys are ignored.
    /// Returns the number of rows affected.
    fn delete_batch(
        &mut self,
        resource: &str,
        ids: &[RecordId],
        deletion: Deletion<'_>,
    ) -> StoreResult<usize>;

    fn commit(self: Box<Self>) -> StoreResult<()>;

    fn rollback(self: Box<Self>) -> StoreResult<()>;
}

/// Answers `exists` validation rules from a store
pub struct StoreLookup<'a>(pub &'a dyn Store);

impl ExistenceCheck for StoreLookup<'_> {
    fn exists(&self, resource: &str, id: RecordId) -> StoreResult<bool> {
        Ok(self.0.find(resource, id)?.is_some())
    }
}
