use crate::resource::{DeleteMode, DeletePolicy, FieldType, Relation, ResourceDescriptor, ResourceResult};
use crate::validation::{Rule, RuleSet};

pub fn descriptor() -> ResourceResult<ResourceDescriptor> {
    ResourceDescriptor::builder("ticket")
        .field("passenger_id", FieldType::Id)
        .field("schedule_id", FieldType::Id)
        .soft_delete("deleted")
        .listable(["id", "passenger_id", "schedule_id", "deleted"])
        .searchable(["id"])
        .relation(Relation::many_to_one("passenger", "passenger_id", "passenger"))
        .relation(Relation::many_to_one("schedule", "schedule_id", "schedule"))
        .delete_policy(DeletePolicy {
            destroy: DeleteMode::Soft,
            bulk_destroy: DeleteMode::Hard,
        })
        .store_rules(
            RuleSet::new()
                .field("passenger_id", [Rule::Required, Rule::exists("passenger")])
                .field("schedule_id", [Rule::Required, Rule::exists("schedule")]),
        )
        .build()
}
