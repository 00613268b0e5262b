//! Form requests: validate, then sanitize, raw input
//!
//! `validated()` keeps only the fields named in the rule set. Anything else
//! in the request body is dropped before it can reach persistence.

use std::fmt;

use serde_json::{Map, Value};

use crate::resource::record::RecordId;
use crate::store::StoreError;

use super::errors::{ValidationErrors, ValidationResult};
use super::rules::{attribute_name, check_field, value_as_id, FieldCheck, RuleSet};

/// Post-validation input transform. The default keeps input as-is.
pub trait Sanitizer: fmt::Debug + Send + Sync {
    fn sanitize(&self, validated: Map<String, Value>) -> Map<String, Value>;
}

/// Sanitizer that returns its input unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepInput;

impl Sanitizer for KeepInput {
    fn sanitize(&self, validated: Map<String, Value>) -> Map<String, Value> {
        validated
    }
}

/// Answers `exists` rules
pub trait ExistenceCheck {
    fn exists(&self, resource: &str, id: RecordId) -> Result<bool, StoreError>;
}

/// Why a form request was rejected
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),

    /// The store could not answer an `exists` lookup
    #[error("lookup failed: {0}")]
    Lookup(#[from] StoreError),
}

/// A rule set bound to a sanitizer
pub struct FormRequest<'a> {
    rules: &'a RuleSet,
    sanitizer: &'a dyn Sanitizer,
}

impl<'a> FormRequest<'a> {
    pub fn new(rules: &'a RuleSet, sanitizer: &'a dyn Sanitizer) -> Self {
        Self { rules, sanitizer }
    }

    /// Validate `input` and return only the validated fields
    pub fn validated(
        &self,
        input: &Value,
        lookup: &dyn ExistenceCheck,
    ) -> Result<Map<String, Value>, FormError> {
        let Some(body) = input.as_object() else {
            return Err(ValidationErrors::single("body", "The request body must be an object.").into());
        };

        let mut errors = ValidationErrors::new();
        let mut validated = Map::new();

        for field in self.rules.fields() {
            let value = body.get(&field.field);
            match check_field(field, value) {
                FieldCheck::Skip => {}
                FieldCheck::Pass => {
                    validated.insert(field.field.clone(), value.cloned().unwrap_or(Value::Null));
                }
                FieldCheck::Fail(message) => errors.add(field.field.clone(), message),
                FieldCheck::Lookup { resource, id } => {
                    if lookup.exists(&resource, id)? {
                        validated.insert(field.field.clone(), value.cloned().unwrap_or(Value::Null));
                    } else {
                        errors.add(
                            field.field.clone(),
                            format!("The selected {} is invalid.", attribute_name(&field.field)),
                        );
                    }
                }
            }
        }

        Ok(errors.into_result(validated)?)
    }

    /// Validate, then run the sanitizer over the validated fields
    pub fn sanitized(
        &self,
        input: &Value,
        lookup: &dyn ExistenceCheck,
    ) -> Result<Map<String, Value>, FormError> {
        let validated = self.validated(input, lookup)?;
        Ok(self.sanitizer.sanitize(validated))
    }
}

/// Body of a bulk-destroy request: `{"data": {"ids": [..]}}`
pub struct BulkDestroyRequest;

impl BulkDestroyRequest {
    pub fn ids(input: &Value) -> ValidationResult<Vec<RecordId>> {
        let Some(ids) = input.get("data").and_then(|d| d.get("ids")) else {
            return Err(ValidationErrors::single("data.ids", "The data.ids field is required."));
        };
        let Some(items) = ids.as_array() else {
            return Err(ValidationErrors::single("data.ids", "The data.ids must be an array."));
        };
        if items.is_empty() {
            return Err(ValidationErrors::single("data.ids", "The data.ids field is required."));
        }

        let mut errors = ValidationErrors::new();
        let mut parsed = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match value_as_id(item) {
                Some(id) => parsed.push(id),
                None => errors.add(
                    format!("data.ids.{}", index),
                    format!("The data.ids.{} must be an integer.", index),
                ),
            }
        }
        errors.into_result(parsed)
    }
}
