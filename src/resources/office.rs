use std::sync::Arc;

use super::TrimText;
use crate::resource::{FieldType, Relation, ResourceDescriptor, ResourceError, ResourceResult};
use crate::validation::{Rule, RuleSet};

/// Digits with optional leading `+` and single spaces or dashes between groups
const PHONE_PATTERN: &str = r"^\+?[0-9]+([ -][0-9]+)*$";

pub fn descriptor() -> ResourceResult<ResourceDescriptor> {
    let phone = Rule::pattern(PHONE_PATTERN).map_err(|e| ResourceError::InvalidPattern {
        resource: "office".to_string(),
        field: "phone".to_string(),
        reason: e.to_string(),
    })?;

    ResourceDescriptor::builder("office")
        .field("phone", FieldType::Text)
        .field("address", FieldType::Text)
        .field("city_id", FieldType::Id)
        .listable(["id", "phone", "address", "city_id"])
        .searchable(["id", "phone", "address"])
        .relation(Relation::many_to_one("city", "city_id", "city"))
        .store_rules(
            RuleSet::new()
                .field("phone", [Rule::Required, Rule::String, phone])
                .field("address", [Rule::Required, Rule::String, Rule::MaxLength(255)])
                .field("city_id", [Rule::Required, Rule::exists("city")]),
        )
        .sanitizer(Arc::new(TrimText::new(["address"])))
        .build()
}
