//! Input sanitizers shared by catalog resources

use serde_json::{Map, Value};

use crate::validation::Sanitizer;

/// Trims surrounding whitespace from the named text fields
#[derive(Debug, Clone)]
pub struct TrimText {
    fields: Vec<String>,
}

impl TrimText {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl Sanitizer for TrimText {
    fn sanitize(&self, mut validated: Map<String, Value>) -> Map<String, Value> {
        for field in &self.fields {
            if let Some(Value::String(text)) = validated.get_mut(field) {
                let trimmed = text.trim();
                if trimmed.len() != text.len() {
                    *text = trimmed.to_string();
                }
            }
        }
        validated
    }
}
