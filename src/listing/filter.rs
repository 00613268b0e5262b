//! # Filter Expressions
//!
//! Per-column filters and free-text search, evaluated against records.

use std::cmp::Ordering;

use serde::Serialize;
use serde_json::Value;

use crate::resource::{FieldType, Record};

/// Filter condition on one column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum FilterCondition {
    /// Equal to the value
    Exact { value: Value },
    /// Between the bounds, each inclusive and optional
    Range {
        min: Option<Value>,
        max: Option<Value>,
    },
}

/// A filter expression
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterExpr {
    /// Field to filter on
    pub field: String,

    pub condition: FilterCondition,
}

impl FilterExpr {
    /// Create an equality filter
    pub fn exact(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            condition: FilterCondition::Exact { value },
        }
    }

    /// Create a range filter
    pub fn range(field: impl Into<String>, min: Option<Value>, max: Option<Value>) -> Self {
        Self {
            field: field.into(),
            condition: FilterCondition::Range { min, max },
        }
    }

    /// Parse filter text for a column of `field_type`.
    ///
    /// Range-capable types accept `min..max`, `min..` and `..max`.
    /// Everything else is an exact match.
    pub fn parse(field: &str, field_type: FieldType, raw: &str) -> Option<Self> {
        if field_type.supports_range() {
            if let Some((min, max)) = raw.split_once("..") {
                let bound = |text: &str| -> Option<Option<Value>> {
                    if text.trim().is_empty() {
                        Some(None)
                    } else {
                        field_type.parse_str(text).map(Some)
                    }
                };
                let (min, max) = (bound(min)?, bound(max)?);
                if min.is_none() && max.is_none() {
                    return None;
                }
                return Some(Self::range(field, min, max));
            }
        }
        field_type
            .parse_str(raw)
            .map(|value| Self::exact(field, value))
    }

    /// Check if a record matches this filter
    pub fn matches(&self, record: &Record) -> bool {
        let field_value = record.get(&self.field).unwrap_or(&Value::Null);

        match &self.condition {
            FilterCondition::Exact { value } => values_equal(field_value, value),
            FilterCondition::Range { min, max } => {
                if field_value.is_null() {
                    return false;
                }
                let above = min.as_ref().map_or(true, |min| {
                    comparable(field_value, min)
                        && compare_values(field_value, min) != Ordering::Less
                });
                let below = max.as_ref().map_or(true, |max| {
                    comparable(field_value, max)
                        && compare_values(field_value, max) != Ordering::Greater
                });
                above && below
            }
        }
    }
}

/// Case-insensitive substring search across columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchClause {
    pub columns: Vec<String>,
    /// Lowercased search term
    pub term: String,
}

impl SearchClause {
    /// Returns `None` for an empty term or no searchable columns
    pub fn new(columns: &[String], term: &str) -> Option<Self> {
        let term = term.trim();
        if term.is_empty() || columns.is_empty() {
            return None;
        }
        Some(Self {
            columns: columns.to_vec(),
            term: term.to_lowercase(),
        })
    }

    /// True if any column contains the term
    pub fn matches(&self, record: &Record) -> bool {
        self.columns.iter().any(|column| {
            record
                .text(column)
                .is_some_and(|text| text.to_lowercase().contains(&self.term))
        })
    }
}

fn comparable(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Number(_), Value::Number(_))
            | (Value::String(_), Value::String(_))
            | (Value::Bool(_), Value::Bool(_))
    )
}

/// Equality that treats `5` and `5.0` as equal
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare_values(a, b) == Ordering::Equal,
        _ => a == b,
    }
}

/// Total order over JSON scalars: null < bool < number < string < other.
///
/// Dates and times are stored in sortable text form, so string order is
/// also chronological order.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or(0.0);
            let b = b.as_f64().unwrap_or(0.0);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
