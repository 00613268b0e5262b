use crate::resource::{FieldType, Relation, ResourceDescriptor, ResourceResult};
use crate::validation::{Rule, RuleSet};

pub fn descriptor() -> ResourceResult<ResourceDescriptor> {
    ResourceDescriptor::builder("route")
        .field("departure", FieldType::Text)
        .field("arrival", FieldType::Text)
        .listable(["id", "departure", "arrival"])
        .searchable(["id", "departure", "arrival"])
        .relation(Relation::one_to_many("schedules", "route_id", "schedule"))
        .store_rules(
            RuleSet::new()
                .field("departure", [Rule::Required, Rule::String, Rule::MaxLength(255)])
                .field("arrival", [Rule::Required, Rule::String, Rule::MaxLength(255)]),
        )
        .build()
}
