//! Registry of every resource served by the admin surface

use std::collections::BTreeMap;
use std::sync::Arc;

use super::descriptor::ResourceDescriptor;
use super::errors::{ResourceError, ResourceResult};
use super::relation::Cardinality;

/// Resources by singular name, with a plural index for URL lookups
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    resources: BTreeMap<String, Arc<ResourceDescriptor>>,
    plurals: BTreeMap<String, String>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor. Cross-resource references are checked by
    /// `verify` once everything is registered.
    pub fn register(&mut self, descriptor: ResourceDescriptor) -> ResourceResult<()> {
        let name = descriptor.name().to_string();
        let plural = descriptor.plural().to_string();
        if self.resources.contains_key(&name) || self.plurals.contains_key(&plural) {
            return Err(ResourceError::DuplicateResource(name));
        }
        self.plurals.insert(plural, name.clone());
        self.resources.insert(name, Arc::new(descriptor));
        Ok(())
    }

    /// Check that every relation and `exists` rule targets a registered
    /// resource, and that one-to-many foreign keys exist on the target.
    pub fn verify(&self) -> ResourceResult<()> {
        for descriptor in self.resources.values() {
            for relation in descriptor.relations() {
                let target = self.resources.get(&relation.target).ok_or_else(|| {
                    ResourceError::UnknownRelationTarget {
                        resource: descriptor.name().to_string(),
                        relation: relation.name.clone(),
                        target: relation.target.clone(),
                    }
                })?;
                if relation.cardinality == Cardinality::OneToMany
                    && target.field_type(&relation.foreign_key).is_none()
                {
                    return Err(ResourceError::UnknownColumn {
                        resource: target.name().to_string(),
                        column: relation.foreign_key.clone(),
                    });
                }
            }

            let rules = descriptor
                .store_rules()
                .fields()
                .iter()
                .chain(descriptor.update_rules().fields());
            for field in rules {
                for target in field.exists_targets() {
                    if !self.resources.contains_key(target) {
                        return Err(ResourceError::UnknownRelationTarget {
                            resource: descriptor.name().to_string(),
                            relation: field.field.clone(),
                            target: target.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Look up by singular name
    pub fn get(&self, name: &str) -> ResourceResult<&Arc<ResourceDescriptor>> {
        self.resources
            .get(name)
            .ok_or_else(|| ResourceError::UnknownResource(name.to_string()))
    }

    /// Look up by plural (URL) name
    pub fn by_plural(&self, plural: &str) -> ResourceResult<&Arc<ResourceDescriptor>> {
        self.plurals
            .get(plural)
            .and_then(|name| self.resources.get(name))
            .ok_or_else(|| ResourceError::UnknownResource(plural.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ResourceDescriptor>> {
        self.resources.values()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{FieldType, Relation};
    use crate::validation::{Rule, RuleSet};

    fn city() -> ResourceDescriptor {
        ResourceDescriptor::builder("city")
            .plural("cities")
            .field("name", FieldType::Text)
            .listable(["id", "name"])
            .relation(Relation::one_to_many("offices", "city_id", "office"))
            .build()
            .unwrap()
    }

    fn office() -> ResourceDescriptor {
        ResourceDescriptor::builder("office")
            .field("city_id", FieldType::Id)
            .listable(["id", "city_id"])
            .relation(Relation::many_to_one("city", "city_id", "city"))
            .store_rules(RuleSet::new().field("city_id", [Rule::Required, Rule::exists("city")]))
            .build()
            .unwrap()
    }

    #[test]
    fn test_lookup_by_name_and_plural() {
        let mut registry = ResourceRegistry::new();
        registry.register(city()).unwrap();
        registry.register(office()).unwrap();
        registry.verify().unwrap();

        assert_eq!(registry.get("city").unwrap().plural(), "cities");
        assert_eq!(registry.by_plural("offices").unwrap().name(), "office");
        assert!(matches!(
            registry.by_plural("city"),
            Err(ResourceError::UnknownResource(_))
        ));
    }

    #[test]
    fn test_rejects_duplicates() {
        let mut registry = ResourceRegistry::new();
        registry.register(city()).unwrap();
        assert_eq!(
            registry.register(city()),
            Err(ResourceError::DuplicateResource("city".to_string()))
        );
    }

    #[test]
    fn test_verify_catches_dangling_targets() {
        let mut registry = ResourceRegistry::new();
        registry.register(office()).unwrap();
        assert!(matches!(
            registry.verify(),
            Err(ResourceError::UnknownRelationTarget { target, .. }) if target == "city"
        ));
    }

    #[test]
    fn test_verify_checks_one_to_many_foreign_key() {
        let orphan_office = ResourceDescriptor::builder("office")
            .field("town_id", FieldType::Id)
            .build()
            .unwrap();
        let mut registry = ResourceRegistry::new();
        registry.register(city()).unwrap();
        registry.register(orphan_office).unwrap();
        assert!(matches!(
            registry.verify(),
            Err(ResourceError::UnknownColumn { column, .. }) if column == "city_id"
        ));
    }
}
