use std::sync::Arc;

use super::TrimText;
use crate::resource::{FieldType, Relation, ResourceDescriptor, ResourceResult};
use crate::validation::{Rule, RuleSet};

pub fn descriptor() -> ResourceResult<ResourceDescriptor> {
    ResourceDescriptor::builder("passenger")
        .field("name", FieldType::Text)
        .field("surname", FieldType::Text)
        .listable(["id", "name", "surname"])
        .searchable(["id", "name", "surname"])
        .relation(Relation::one_to_many("tickets", "passenger_id", "ticket"))
        .store_rules(
            RuleSet::new()
                .field("name", [Rule::Required, Rule::String, Rule::MaxLength(255)])
                .field("surname", [Rule::Required, Rule::String, Rule::MaxLength(255)]),
        )
        .sanitizer(Arc::new(TrimText::new(["name", "surname"])))
        .build()
}
