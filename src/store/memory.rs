//! In-memory store
//!
//! Tables live behind one `RwLock`. A transaction holds the write guard
//! for its whole lifetime and stages its changes in copies of the tables
//! it touches; commit swaps the copies in, rollback drops them.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockWriteGuard};

use serde_json::{Map, Value};

use super::{Deletion, Store, StoreError, StoreResult, Transaction};
use crate::listing::{values_equal, ListOutcome, ListQuery};
use crate::resource::{Record, RecordId};

#[derive(Debug, Clone, Default)]
struct Table {
    rows: BTreeMap<RecordId, Record>,
    next_id: RecordId,
}

impl Table {
    fn insert(&mut self, values: Map<String, Value>) -> Record {
        self.next_id += 1;
        let record = Record::new(self.next_id, values);
        self.rows.insert(record.id(), record.clone());
        record
    }

    fn delete(&mut self, id: RecordId, deletion: Deletion<'_>) -> bool {
        match deletion {
            Deletion::Remove => self.rows.remove(&id).is_some(),
            Deletion::Mark(marker) => match self.rows.get_mut(&id) {
                Some(record) => {
                    record.set(marker, Value::Bool(true));
                    true
                }
                None => false,
            },
        }
    }
}

type Tables = HashMap<String, Table>;

/// Store backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows in a resource's table, soft-marked rows included
    pub fn count(&self, resource: &str) -> StoreResult<usize> {
        let tables = self.tables.read()?;
        Ok(tables.get(resource).map_or(0, |t| t.rows.len()))
    }
}

impl Store for MemoryStore {
    fn list(&self, resource: &str, query: &ListQuery) -> StoreResult<ListOutcome> {
        let tables = self.tables.read()?;
        Ok(match tables.get(resource) {
            Some(table) => query.execute(table.rows.values()),
            None => ListOutcome {
                records: Vec::new(),
                total: 0,
            },
        })
    }

    fn find(&self, resource: &str, id: RecordId) -> StoreResult<Option<Record>> {
        let tables = self.tables.read()?;
        Ok(tables.get(resource).and_then(|t| t.rows.get(&id)).cloned())
    }

    fn find_many(&self, resource: &str, ids: &[RecordId]) -> StoreResult<Vec<Record>> {
        let tables = self.tables.read()?;
        let Some(table) = tables.get(resource) else {
            return Ok(Vec::new());
        };
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids
            .into_iter()
            .filter_map(|id| table.rows.get(&id).cloned())
            .collect())
    }

    fn find_by(&self, resource: &str, field: &str, value: &Value) -> StoreResult<Vec<Record>> {
        let tables = self.tables.read()?;
        Ok(tables
            .get(resource)
            .map(|table| {
                table
                    .rows
                    .values()
                    .filter(|r| r.get(field).is_some_and(|v| values_equal(v, value)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn insert(&self, resource: &str, values: Map<String, Value>) -> StoreResult<Record> {
        let mut tables = self.tables.write()?;
        Ok(tables.entry(resource.to_string()).or_default().insert(values))
    }

    fn update(
        &self,
        resource: &str,
        id: RecordId,
        changes: Map<String, Value>,
    ) -> StoreResult<Record> {
        let mut tables = self.tables.write()?;
        let record = tables
            .get_mut(resource)
            .and_then(|t| t.rows.get_mut(&id))
            .ok_or_else(|| StoreError::NotFound {
                resource: resource.to_string(),
                id,
            })?;
        record.merge(changes);
        Ok(record.clone())
    }

    fn delete(&self, resource: &str, id: RecordId, deletion: Deletion<'_>) -> StoreResult<bool> {
        let mut tables = self.tables.write()?;
        Ok(tables
            .get_mut(resource)
            .is_some_and(|t| t.delete(id, deletion)))
    }

    fn begin(&self) -> StoreResult<Box<dyn Transaction + '_>> {
        let guard = self.tables.write()?;
        Ok(Box::new(MemoryTransaction {
            guard,
            staged: HashMap::new(),
        }))
    }
}

/// Transaction over a `MemoryStore`
struct MemoryTransaction<'a> {
    guard: RwLockWriteGuard<'a, Tables>,
    staged: Tables,
}

impl MemoryTransaction<'_> {
    fn table(&mut self, resource: &str) -> &mut Table {
        if !self.staged.contains_key(resource) {
            let current = self.guard.get(resource).cloned().unwrap_or_default();
            self.staged.insert(resource.to_string(), current);
        }
        self.staged.entry(resource.to_string()).or_default()
    }
}

impl Transaction for MemoryTransaction<'_> {
    fn delete_batch(
        &mut self,
        resource: &str,
        ids: &[RecordId],
        deletion: Deletion<'_>,
    ) -> StoreResult<usize> {
        let table = self.table(resource);
        Ok(ids.iter().filter(|id| table.delete(**id, deletion)).count())
    }

    fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTransaction { mut guard, staged } = *self;
        guard.extend(staged);
        Ok(())
    }

    fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{ListQueryBuilder, ListParams, ListingConfig};
    use crate::resource::{FieldType, ResourceDescriptor};
    use serde_json::json;

    fn values(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn seeded(n: usize) -> MemoryStore {
        let store = MemoryStore::new();
        for i in 0..n {
            store.insert("city", values(json!({"name": format!("city-{}", i)}))).unwrap();
        }
        store
    }

    #[test]
    fn test_insert_assigns_sequential_keys() {
        let store = MemoryStore::new();
        let a = store.insert("city", values(json!({"name": "Riga"}))).unwrap();
        let b = store.insert("city", values(json!({"name": "Cesis", "id": 77}))).unwrap();
        assert_eq!(a.id(), 1);
        assert_eq!(b.id(), 2);
        assert_eq!(store.find("city", 2).unwrap().unwrap().get("name"), Some(&json!("Cesis")));
    }

    #[test]
    fn test_update_missing_row() {
        let store = MemoryStore::new();
        let err = store.update("city", 9, Map::new()).unwrap_err();
        assert_eq!(
            err,
            StoreError::NotFound {
                resource: "city".to_string(),
                id: 9
            }
        );
    }

    #[test]
    fn test_soft_and_hard_delete() {
        let store = seeded(2);
        assert!(store.delete("city", 1, Deletion::Mark("deleted")).unwrap());
        assert!(store.find("city", 1).unwrap().unwrap().is_marked("deleted"));

        assert!(store.delete("city", 2, Deletion::Remove).unwrap());
        assert!(store.find("city", 2).unwrap().is_none());
        assert!(!store.delete("city", 2, Deletion::Remove).unwrap());
    }

    #[test]
    fn test_find_many_and_find_by() {
        let store = seeded(3);
        let found = store.find_many("city", &[3, 1, 9, 1]).unwrap();
        let ids: Vec<_> = found.iter().map(Record::id).collect();
        assert_eq!(ids, vec![1, 3]);

        let named = store.find_by("city", "name", &json!("city-1")).unwrap();
        assert_eq!(named.len(), 1);
        assert_eq!(named[0].id(), 2);
    }

    #[test]
    fn test_list_runs_query() {
        let store = seeded(15);
        let city = ResourceDescriptor::builder("city")
            .plural("cities")
            .field("name", FieldType::Text)
            .listable(["id", "name"])
            .build()
            .unwrap();
        let config = ListingConfig::default();
        let query = ListQueryBuilder::new(&city, &config)
            .build(&ListParams::default())
            .unwrap();

        let outcome = store.list("city", &query).unwrap();
        assert_eq!(outcome.total, 15);
        assert_eq!(outcome.records.len(), 10);
        assert_eq!(store.list("office", &query).unwrap().total, 0);
    }

    #[test]
    fn test_transaction_commit() {
        let store = seeded(5);
        let mut tx = store.begin().unwrap();
        assert_eq!(tx.delete_batch("city", &[1, 2], Deletion::Remove).unwrap(), 2);
        assert_eq!(tx.delete_batch("city", &[3, 42], Deletion::Remove).unwrap(), 1);
        tx.commit().unwrap();
        assert_eq!(store.count("city").unwrap(), 2);
    }

    #[test]
    fn test_transaction_rollback_discards_every_batch() {
        let store = seeded(5);
        let mut tx = store.begin().unwrap();
        tx.delete_batch("city", &[1, 2], Deletion::Remove).unwrap();
        tx.delete_batch("city", &[3], Deletion::Mark("deleted")).unwrap();
        tx.rollback().unwrap();

        assert_eq!(store.count("city").unwrap(), 5);
        assert!(!store.find("city", 3).unwrap().unwrap().is_marked("deleted"));
    }

    #[test]
    fn test_dropped_transaction_rolls_back() {
        let store = seeded(2);
        {
            let mut tx = store.begin().unwrap();
            tx.delete_batch("city", &[1, 2], Deletion::Remove).unwrap();
        }
        assert_eq!(store.count("city").unwrap(), 2);
    }
}
