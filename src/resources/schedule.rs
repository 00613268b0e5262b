use crate::resource::{
    BulkAuthorization, DeleteMode, DeletePolicy, FieldType, Relation, ResourceDescriptor,
    ResourceResult,
};
use crate::validation::{Rule, RuleSet};

pub fn descriptor() -> ResourceResult<ResourceDescriptor> {
    ResourceDescriptor::builder("schedule")
        .field("date", FieldType::Date)
        .field("time", FieldType::Time)
        .field("cost", FieldType::Decimal)
        .field("confirmed", FieldType::Boolean)
        .field("transport_id", FieldType::Id)
        .field("route_id", FieldType::Id)
        .soft_delete("deleted")
        .hide_marked()
        .listable(["id", "date", "time", "cost", "confirmed", "transport_id", "route_id"])
        .searchable(["id"])
        .relation(Relation::many_to_one("transport", "transport_id", "transport"))
        .relation(Relation::many_to_one("route", "route_id", "route"))
        .relation(Relation::one_to_many("tickets", "schedule_id", "ticket"))
        .delete_policy(DeletePolicy {
            destroy: DeleteMode::Soft,
            bulk_destroy: DeleteMode::Hard,
        })
        .bulk_authorization(BulkAuthorization::PerRecord)
        .store_rules(
            RuleSet::new()
                .field("date", [Rule::Required, Rule::Date])
                .field("time", [Rule::Required, Rule::date_format("%H:%M:%S")])
                .field("cost", [Rule::Required, Rule::Numeric])
                .field("confirmed", [Rule::Nullable, Rule::Boolean])
                .field("transport_id", [Rule::Required, Rule::exists("transport")])
                .field("route_id", [Rule::Required, Rule::exists("route")]),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_is_not_fillable() {
        let schedule = descriptor().unwrap();
        assert_eq!(schedule.soft_delete_field(), Some("deleted"));
        assert!(!schedule.fillable().iter().any(|f| f == "deleted"));
        assert_eq!(schedule.hidden_marker(), Some("deleted"));
    }

    #[test]
    fn test_cost_accepts_any_number() {
        let schedule = descriptor().unwrap();
        let cost = schedule.store_rules().get("cost").unwrap();
        let names: Vec<&str> = cost.rules.iter().map(Rule::name).collect();
        assert_eq!(names, ["required", "numeric"]);
    }

    #[test]
    fn test_range_filterable_columns() {
        let schedule = descriptor().unwrap();
        assert!(schedule.field_type("date").unwrap().supports_range());
        assert!(schedule.field_type("cost").unwrap().supports_range());
    }
}
