//! Records: one row of a resource
//!
//! A record always carries its primary key under the `id` field, so
//! filters, search, and projection can treat `id` like any other column.

use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Primary key type for every resource
pub type RecordId = u64;

/// Name of the primary key column
pub const PRIMARY_KEY: &str = "id";

/// A stored row
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: RecordId,
    values: Map<String, Value>,
}

impl Record {
    /// Create a record, writing `id` as the first column
    pub fn new(id: RecordId, values: Map<String, Value>) -> Self {
        let mut ordered = Map::with_capacity(values.len() + 1);
        ordered.insert(PRIMARY_KEY.to_string(), Value::from(id));
        for (key, value) in values {
            if key != PRIMARY_KEY {
                ordered.insert(key, value);
            }
        }
        Self {
            id,
            values: ordered,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Get a column value (`id` included)
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Overwrite the given columns. The primary key cannot be changed.
    pub fn merge(&mut self, changes: Map<String, Value>) {
        for (key, value) in changes {
            if key != PRIMARY_KEY {
                self.values.insert(key, value);
            }
        }
    }

    /// Set a single column
    pub fn set(&mut self, column: &str, value: Value) {
        if column != PRIMARY_KEY {
            self.values.insert(column.to_string(), value);
        }
    }

    /// Whether the soft-delete marker in `column` is set
    pub fn is_marked(&self, column: &str) -> bool {
        match self.values.get(column) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
            Some(Value::String(s)) => !s.is_empty(),
            _ => false,
        }
    }

    /// Copy of this record keeping only `columns`, in that order
    pub fn project(&self, columns: &[String]) -> Record {
        let values = columns
            .iter()
            .map(|c| (c.clone(), self.values.get(c).cloned().unwrap_or(Value::Null)))
            .collect();
        Record::new(self.id, values)
    }

    /// Render a column for text search
    pub fn text(&self, column: &str) -> Option<String> {
        match self.values.get(column)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}
