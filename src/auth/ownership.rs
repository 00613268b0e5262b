//! # Ownership Scoping
//!
//! Wraps another permission service. For resources that declare an owner
//! field, a record-scoped check also requires the record's owner to equal
//! the caller. Checks without a record pass straight through.

use std::collections::HashMap;

use super::caller::Caller;
use super::permission::{Permission, PermissionService};
use crate::resource::{Record, ResourceRegistry};

/// Owner-field enforcement on top of an inner service
#[derive(Debug, Clone)]
pub struct OwnershipPolicy<P> {
    inner: P,
    owner_fields: HashMap<String, String>,
}

impl<P: PermissionService> OwnershipPolicy<P> {
    /// Collect owner fields from every registered resource
    pub fn new(inner: P, registry: &ResourceRegistry) -> Self {
        let owner_fields = registry
            .iter()
            .filter_map(|d| {
                d.owner_field()
                    .map(|field| (d.name().to_string(), field.to_string()))
            })
            .collect();
        Self {
            inner,
            owner_fields,
        }
    }

    fn owns(&self, caller: &Caller, resource: &str, record: &Record) -> bool {
        let Some(field) = self.owner_fields.get(resource) else {
            return true;
        };
        match (caller.id(), record.text(field)) {
            (Some(caller), Some(owner)) => caller == owner,
            _ => false,
        }
    }
}

impl<P: PermissionService> PermissionService for OwnershipPolicy<P> {
    fn allows(&self, caller: &Caller, permission: &Permission, record: Option<&Record>) -> bool {
        if !self.inner.allows(caller, permission, record) {
            return false;
        }
        record.map_or(true, |r| self.owns(caller, &permission.resource, r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Ability, GrantTable};
    use crate::resource::{FieldType, ResourceDescriptor};
    use serde_json::json;

    fn policy() -> OwnershipPolicy<GrantTable> {
        let mut registry = ResourceRegistry::new();
        registry
            .register(
                ResourceDescriptor::builder("passenger")
                    .field("name", FieldType::Text)
                    .field("agent", FieldType::Text)
                    .owner_field("agent")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
            .register(
                ResourceDescriptor::builder("city")
                    .plural("cities")
                    .field("name", FieldType::Text)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let grants = GrantTable::new()
            .grant("alice", "*")
            .unwrap()
            .grant("bob", "*")
            .unwrap();
        OwnershipPolicy::new(grants, &registry)
    }

    fn record(value: serde_json::Value) -> Record {
        Record::new(1, value.as_object().cloned().unwrap())
    }

    #[test]
    fn test_record_scoped_checks_require_ownership() {
        let policy = policy();
        let edit = Permission::new("passenger", Ability::Edit);
        let owned = record(json!({"name": "Anna", "agent": "alice"}));

        assert!(policy.allows(&Caller::user("alice"), &edit, Some(&owned)));
        assert!(!policy.allows(&Caller::user("bob"), &edit, Some(&owned)));
        assert!(!policy.allows(
            &Caller::user("alice"),
            &edit,
            Some(&record(json!({"name": "Orphan"})))
        ));
    }

    #[test]
    fn test_unscoped_checks_pass_through() {
        let policy = policy();
        assert!(policy.allows(
            &Caller::user("bob"),
            &Permission::new("passenger", Ability::Index),
            None
        ));
        assert!(policy.allows(
            &Caller::user("bob"),
            &Permission::new("city", Ability::Edit),
            Some(&record(json!({"name": "Riga"})))
        ));
    }

    #[test]
    fn test_owner_mismatch_blocks_update() {
        use std::sync::Arc;

        use crate::admin::{AdminError, AdminService};
        use crate::store::{MemoryStore, Store};
        use crate::validation::{Rule, RuleSet};

        let mut registry = ResourceRegistry::new();
        registry
            .register(
                ResourceDescriptor::builder("passenger")
                    .field("name", FieldType::Text)
                    .field("agent", FieldType::Text)
                    .owner_field("agent")
                    .fillable(["name"])
                    .store_rules(RuleSet::new().field("name", [Rule::Required, Rule::String]))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let grants = GrantTable::new().grant("alice", "*").unwrap().grant("bob", "*").unwrap();
        let policy = OwnershipPolicy::new(grants, &registry);
        let store = Arc::new(MemoryStore::new());
        let registry = Arc::new(registry);
        let service = AdminService::new(Arc::clone(&registry), store.clone(), Arc::new(policy));
        let passenger = Arc::clone(registry.get("passenger").unwrap());

        let created = service
            .create(&passenger, &Caller::user("alice"), &json!({"name": "Anna"}))
            .unwrap();
        assert_eq!(created.get("agent"), Some(&json!("alice")));

        let err = service
            .update(&passenger, &Caller::user("bob"), created.id(), &json!({"name": "Marta"}))
            .unwrap_err();
        assert!(matches!(err, AdminError::Authorization { permission } if permission == "admin.passenger.edit"));
        let stored = store.find("passenger", created.id()).unwrap().unwrap();
        assert_eq!(stored.get("name"), Some(&json!("Anna")));
    }

    #[test]
    fn test_inner_denial_wins() {
        let policy = policy();
        assert!(!policy.allows(
            &Caller::anonymous(),
            &Permission::new("city", Ability::Index),
            None
        ));
    }
}
