//! Field type definitions for resource descriptors
//!
//! Supported types:
//! - id: system or foreign key (unsigned integer)
//! - integer: 64-bit signed integer
//! - decimal: 64-bit floating point
//! - text: UTF-8 string
//! - boolean
//! - date: `YYYY-MM-DD`
//! - time: `HH:MM:SS`
//! - timestamp: `YYYY-MM-DD HH:MM:SS`

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical date format stored in records
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Canonical time format stored in records
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Canonical timestamp format stored in records
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Supported field types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Primary or foreign key
    Id,
    /// 64-bit signed integer
    Integer,
    /// 64-bit floating point
    Decimal,
    /// UTF-8 string
    Text,
    /// Boolean
    Boolean,
    /// Calendar date
    Date,
    /// Wall-clock time
    Time,
    /// Date and time without zone
    Timestamp,
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::Id => "id",
            FieldType::Integer => "integer",
            FieldType::Decimal => "decimal",
            FieldType::Text => "text",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::Timestamp => "timestamp",
        }
    }

    /// Whether list filters on this type accept `min..max` ranges
    pub fn supports_range(&self) -> bool {
        matches!(
            self,
            FieldType::Integer
                | FieldType::Decimal
                | FieldType::Date
                | FieldType::Time
                | FieldType::Timestamp
        )
    }

    /// Parse a raw query-string value into the canonical stored form.
    ///
    /// Returns `None` if the text is not a valid value of this type.
    pub fn parse_str(&self, raw: &str) -> Option<Value> {
        let raw = raw.trim();
        match self {
            FieldType::Id => raw.parse::<u64>().ok().map(Value::from),
            FieldType::Integer => raw.parse::<i64>().ok().map(Value::from),
            FieldType::Decimal => raw
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            FieldType::Text => Some(Value::String(raw.to_string())),
            FieldType::Boolean => parse_bool(raw).map(Value::Bool),
            FieldType::Date => parse_date(raw).map(|d| Value::String(d.format(DATE_FORMAT).to_string())),
            FieldType::Time => parse_time(raw).map(|t| Value::String(t.format(TIME_FORMAT).to_string())),
            FieldType::Timestamp => parse_timestamp(raw)
                .map(|ts| Value::String(ts.format(TIMESTAMP_FORMAT).to_string())),
        }
    }

    /// Cast a validated input value into the canonical stored form.
    ///
    /// `null` is kept as `null`. Returns `None` if the value cannot be cast.
    pub fn cast(&self, value: &Value) -> Option<Value> {
        match value {
            Value::Null => Some(Value::Null),
            Value::String(s) if *self == FieldType::Text => Some(Value::String(s.clone())),
            Value::String(s) => self.parse_str(s),
            Value::Bool(b) => match self {
                FieldType::Boolean => Some(Value::Bool(*b)),
                FieldType::Text => Some(Value::String(b.to_string())),
                _ => None,
            },
            Value::Number(n) => match self {
                FieldType::Id => n.as_u64().map(Value::from),
                FieldType::Integer => n.as_i64().map(Value::from),
                FieldType::Decimal => n
                    .as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number),
                FieldType::Boolean => match n.as_i64() {
                    Some(0) => Some(Value::Bool(false)),
                    Some(1) => Some(Value::Bool(true)),
                    _ => None,
                },
                FieldType::Text => Some(Value::String(n.to_string())),
                _ => None,
            },
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

/// Accepts `true`/`false`, `1`/`0`
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// Accepts `YYYY-MM-DD` or a full timestamp (date part is kept)
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .or_else(|| parse_timestamp(raw).map(|ts| ts.date()))
}

/// Accepts `HH:MM:SS` or `HH:MM`
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .ok()
        .or_else(|| NaiveTime::parse_from_str(raw, "%H:%M").ok())
}

/// Accepts `YYYY-MM-DD HH:MM:SS` or RFC 3339
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

/// A declared field on a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_str_by_type() {
        assert_eq!(FieldType::Id.parse_str("42"), Some(json!(42)));
        assert_eq!(FieldType::Id.parse_str("-1"), None);
        assert_eq!(FieldType::Integer.parse_str("-7"), Some(json!(-7)));
        assert_eq!(FieldType::Decimal.parse_str("12.5"), Some(json!(12.5)));
        assert_eq!(FieldType::Boolean.parse_str("1"), Some(json!(true)));
        assert_eq!(FieldType::Boolean.parse_str("yes"), None);
        assert_eq!(FieldType::Text.parse_str("Riga"), Some(json!("Riga")));
    }

    #[test]
    fn test_parse_temporal_values() {
        assert_eq!(FieldType::Date.parse_str("2024-03-01"), Some(json!("2024-03-01")));
        assert_eq!(
            FieldType::Date.parse_str("2024-03-01 10:00:00"),
            Some(json!("2024-03-01"))
        );
        assert_eq!(FieldType::Date.parse_str("2024-13-01"), None);
        assert_eq!(FieldType::Time.parse_str("08:30"), Some(json!("08:30:00")));
        assert_eq!(FieldType::Time.parse_str("25:00:00"), None);
        assert_eq!(
            FieldType::Timestamp.parse_str("2024-03-01T10:00:00Z"),
            Some(json!("2024-03-01 10:00:00"))
        );
    }

    #[test]
    fn test_cast_numbers_and_strings() {
        assert_eq!(FieldType::Decimal.cast(&json!("19.90")), Some(json!(19.9)));
        assert_eq!(FieldType::Decimal.cast(&json!(20)), Some(json!(20.0)));
        assert_eq!(FieldType::Id.cast(&json!("3")), Some(json!(3)));
        assert_eq!(FieldType::Boolean.cast(&json!(0)), Some(json!(false)));
        assert_eq!(FieldType::Text.cast(&json!(12)), Some(json!("12")));
        assert_eq!(FieldType::Integer.cast(&json!([1])), None);
        assert_eq!(FieldType::Date.cast(&Value::Null), Some(Value::Null));
    }

    #[test]
    fn test_cast_keeps_text_whitespace() {
        assert_eq!(FieldType::Text.cast(&json!("  Riga  ")), Some(json!("  Riga  ")));
        assert_eq!(FieldType::Id.cast(&json!(" 3 ")), Some(json!(3)));
        assert_eq!(FieldType::Text.parse_str(" Riga "), Some(json!("Riga")));
    }

    #[test]
    fn test_range_support() {
        assert!(FieldType::Decimal.supports_range());
        assert!(FieldType::Date.supports_range());
        assert!(!FieldType::Text.supports_range());
        assert!(!FieldType::Id.supports_range());
        assert!(!FieldType::Boolean.supports_range());
    }
}
