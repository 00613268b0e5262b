use crate::resource::{FieldType, Relation, ResourceDescriptor, ResourceResult};
use crate::validation::{Rule, RuleSet};

pub fn descriptor() -> ResourceResult<ResourceDescriptor> {
    ResourceDescriptor::builder("transport")
        .field("name", FieldType::Text)
        .field("seats", FieldType::Integer)
        .listable(["id", "name", "seats"])
        .searchable(["id", "name"])
        .relation(Relation::one_to_many("schedules", "transport_id", "schedule"))
        .store_rules(
            RuleSet::new()
                .field("name", [Rule::Required, Rule::String, Rule::MaxLength(255)])
                .field("seats", [Rule::Required, Rule::Integer, Rule::Min(1.0)]),
        )
        .build()
}
