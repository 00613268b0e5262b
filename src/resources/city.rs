use crate::resource::{FieldType, Relation, ResourceDescriptor, ResourceResult};
use crate::validation::{Rule, RuleSet};

pub fn descriptor() -> ResourceResult<ResourceDescriptor> {
    ResourceDescriptor::builder("city")
        .plural("cities")
        .field("name", FieldType::Text)
        .listable(["id", "name"])
        .searchable(["id", "name"])
        .relation(Relation::one_to_many("offices", "city_id", "office"))
        .store_rules(RuleSet::new().field(
            "name",
            [Rule::Required, Rule::String, Rule::MaxLength(255)],
        ))
        .build()
}
