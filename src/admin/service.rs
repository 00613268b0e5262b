//! # Admin Service
//!
//! The executors behind every admin action. Each one is gated by a named
//! permission and reports through the `AdminError` taxonomy.
//!
//! ## Ordering
//! - reads: authorize, then build and run the query
//! - create: validate, sanitize, cast, authorize, persist
//! - update: resolve the record, validate, sanitize, cast, authorize, persist
//! - bulk destroy: validate ids, authorize, then every batch in one transaction
//!
//! Every mutation attempt is audited, whatever its outcome.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use super::errors::{AdminError, AdminResult};
use crate::auth::{Ability, Caller, Permission, PermissionService};
use crate::listing::{ListParams, ListQueryBuilder, ListingConfig, Paginated};
use crate::observability::{AuditAction, AuditEvent, AuditOutcome, AuditSink, TracingAuditSink};
use crate::resource::{
    BulkAuthorization, Cardinality, Record, RecordId, ResourceDescriptor, ResourceRegistry,
};
use crate::store::{Deletion, Store, StoreLookup};
use crate::validation::rules::{attribute_name, value_as_id};
use crate::validation::{BulkDestroyRequest, FormRequest, RuleSet, ValidationErrors};

/// Default number of ids deleted per batch
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Result of a bulk destroy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    /// Ids in the request
    pub requested: usize,
    /// Rows actually deleted or marked
    pub deleted: usize,
    pub batches: usize,
}

/// Admin executors over a resource catalog
#[derive(Clone)]
pub struct AdminService {
    registry: Arc<ResourceRegistry>,
    store: Arc<dyn Store>,
    permissions: Arc<dyn PermissionService>,
    audit: Arc<dyn AuditSink>,
    listing: ListingConfig,
    batch_size: usize,
}

impl AdminService {
    pub fn new(
        registry: Arc<ResourceRegistry>,
        store: Arc<dyn Store>,
        permissions: Arc<dyn PermissionService>,
    ) -> Self {
        Self {
            registry,
            store,
            permissions,
            audit: Arc::new(TracingAuditSink),
            listing: ListingConfig::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Page size bounds; both at least 1, the default never above the max
    pub fn with_listing(mut self, listing: ListingConfig) -> Self {
        let max_per_page = listing.max_per_page.max(1);
        self.listing = ListingConfig {
            default_per_page: listing.default_per_page.clamp(1, max_per_page),
            max_per_page,
        };
        self
    }

    /// Batch size for bulk destroy; at least 1
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Resolve a resource by its URL (plural) name
    pub fn resource(&self, plural: &str) -> AdminResult<Arc<ResourceDescriptor>> {
        Ok(Arc::clone(self.registry.by_plural(plural)?))
    }

    /// Check `admin.<resource>.<ability>`, optionally against a record
    pub fn authorize(
        &self,
        caller: &Caller,
        descriptor: &ResourceDescriptor,
        ability: Ability,
        record: Option<&Record>,
    ) -> AdminResult<()> {
        let permission = Permission::new(descriptor.name(), ability);
        if self.permissions.allows(caller, &permission, record) {
            Ok(())
        } else {
            tracing::debug!(caller = %caller, permission = %permission, "permission denied");
            Err(AdminError::Authorization {
                permission: permission.to_string(),
            })
        }
    }

    // ==================
    // Reads
    // ==================

    /// Paginated, filtered, searched listing
    #[tracing::instrument(skip_all, fields(resource = descriptor.name()))]
    pub fn list(
        &self,
        descriptor: &ResourceDescriptor,
        caller: &Caller,
        params: &ListParams,
    ) -> AdminResult<Paginated> {
        self.authorize(caller, descriptor, Ability::Index, None)?;
        let query = ListQueryBuilder::new(descriptor, &self.listing).build(params)?;
        let outcome = self.store.list(descriptor.name(), &query)?;
        tracing::debug!(total = outcome.total, page = query.page, "listed");
        Ok(Paginated::new(&query, outcome))
    }

    /// A visible record. Missing and soft-marked rows are not found.
    pub fn find_visible(
        &self,
        descriptor: &ResourceDescriptor,
        id: RecordId,
    ) -> AdminResult<Record> {
        self.store
            .find(descriptor.name(), id)?
            .filter(|record| !is_hidden(descriptor, record))
            .ok_or_else(|| AdminError::not_found(descriptor.name(), id))
    }

    /// A record with its relations resolved
    pub fn show(
        &self,
        descriptor: &ResourceDescriptor,
        caller: &Caller,
        id: RecordId,
    ) -> AdminResult<Value> {
        let record = self.find_visible(descriptor, id)?;
        self.authorize(caller, descriptor, Ability::Show, Some(&record))?;
        self.with_relations(descriptor, record)
    }

    /// Check access to the create form
    pub fn create_form(&self, descriptor: &ResourceDescriptor, caller: &Caller) -> AdminResult<()> {
        self.authorize(caller, descriptor, Ability::Create, None)
    }

    /// The record behind the edit form
    pub fn edit_form(
        &self,
        descriptor: &ResourceDescriptor,
        caller: &Caller,
        id: RecordId,
    ) -> AdminResult<Record> {
        let record = self.find_visible(descriptor, id)?;
        self.authorize(caller, descriptor, Ability::Edit, Some(&record))?;
        Ok(record)
    }

    fn with_relations(&self, descriptor: &ResourceDescriptor, record: Record) -> AdminResult<Value> {
        let mut related = Map::new();
        for relation in descriptor.relations() {
            let target = self.registry.get(&relation.target)?;
            let value = match relation.cardinality {
                Cardinality::ManyToOne => {
                    let parent = match record.get(&relation.foreign_key).and_then(value_as_id) {
                        Some(id) => self
                            .store
                            .find(target.name(), id)?
                            .filter(|r| !is_hidden(target, r)),
                        None => None,
                    };
                    parent.map_or(Value::Null, Record::into_value)
                }
                Cardinality::OneToMany => {
                    let children = self.store.find_by(
                        target.name(),
                        &relation.foreign_key,
                        &Value::from(record.id()),
                    )?;
                    Value::Array(
                        children
                            .into_iter()
                            .filter(|r| !is_hidden(target, r))
                            .map(Record::into_value)
                            .collect(),
                    )
                }
            };
            related.insert(relation.name.clone(), value);
        }

        let mut value = record.values().clone();
        value.extend(related);
        Ok(Value::Object(value))
    }

    // ==================
    // Mutations
    // ==================

    /// Validate, sanitize, authorize and insert
    #[tracing::instrument(skip_all, fields(resource = descriptor.name()))]
    pub fn create(
        &self,
        descriptor: &ResourceDescriptor,
        caller: &Caller,
        input: &Value,
    ) -> AdminResult<Record> {
        let result = self.try_create(descriptor, caller, input);
        let ids: Vec<RecordId> = result.iter().map(Record::id).collect();
        self.audit(self.event(AuditAction::Create, descriptor, caller, &result).with_ids(&ids));
        result
    }

    fn try_create(
        &self,
        descriptor: &ResourceDescriptor,
        caller: &Caller,
        input: &Value,
    ) -> AdminResult<Record> {
        let mut values = self.validated(descriptor, descriptor.store_rules(), input)?;
        self.authorize(caller, descriptor, Ability::Create, None)?;
        if let (Some(owner), Some(id)) = (descriptor.owner_field(), caller.id()) {
            if values.get(owner).map_or(true, Value::is_null) {
                values.insert(owner.to_string(), Value::from(id));
            }
        }
        if let Some(marker) = descriptor.soft_delete_field() {
            values.insert(marker.to_string(), Value::Bool(false));
        }
        Ok(self.store.insert(descriptor.name(), values)?)
    }

    /// Validate, sanitize, authorize against the record, and merge
    #[tracing::instrument(skip_all, fields(resource = descriptor.name(), id = id))]
    pub fn update(
        &self,
        descriptor: &ResourceDescriptor,
        caller: &Caller,
        id: RecordId,
        input: &Value,
    ) -> AdminResult<Record> {
        let result = self.try_update(descriptor, caller, id, input);
        self.audit(self.event(AuditAction::Update, descriptor, caller, &result).with_id(id));
        result
    }

    fn try_update(
        &self,
        descriptor: &ResourceDescriptor,
        caller: &Caller,
        id: RecordId,
        input: &Value,
    ) -> AdminResult<Record> {
        let current = self.find_visible(descriptor, id)?;
        let changes = self.validated(descriptor, descriptor.update_rules(), input)?;
        self.authorize(caller, descriptor, Ability::Edit, Some(&current))?;
        Ok(self.store.update(descriptor.name(), id, changes)?)
    }

    /// Delete one record per the resource's single-delete policy
    #[tracing::instrument(skip_all, fields(resource = descriptor.name(), id = id))]
    pub fn destroy(
        &self,
        descriptor: &ResourceDescriptor,
        caller: &Caller,
        id: RecordId,
    ) -> AdminResult<()> {
        let result = self.try_destroy(descriptor, caller, id);
        self.audit(self.event(AuditAction::Destroy, descriptor, caller, &result).with_id(id));
        result
    }

    fn try_destroy(
        &self,
        descriptor: &ResourceDescriptor,
        caller: &Caller,
        id: RecordId,
    ) -> AdminResult<()> {
        let record = self.find_visible(descriptor, id)?;
        self.authorize(caller, descriptor, Ability::Delete, Some(&record))?;
        let deletion = Deletion::new(
            descriptor.delete_policy().destroy,
            descriptor.soft_delete_field(),
        );
        if self.store.delete(descriptor.name(), id, deletion)? {
            Ok(())
        } else {
            Err(AdminError::not_found(descriptor.name(), id))
        }
    }

    /// Delete `{"data": {"ids": [..]}}` in batches inside one transaction.
    ///
    /// Authorization completes before the transaction opens. A failing
    /// batch rolls back every batch before it.
    #[tracing::instrument(skip_all, fields(resource = descriptor.name()))]
    pub fn bulk_destroy(
        &self,
        descriptor: &ResourceDescriptor,
        caller: &Caller,
        input: &Value,
    ) -> AdminResult<BulkOutcome> {
        let ids = BulkDestroyRequest::ids(input).map_err(AdminError::from);
        let result = match &ids {
            Ok(ids) => self.try_bulk_destroy(descriptor, caller, ids),
            Err(err) => Err(err.clone()),
        };

        let mut event = self.event(AuditAction::BulkDestroy, descriptor, caller, &result);
        if let Ok(ids) = &ids {
            event = event.with_ids(ids);
        }
        if let Ok(outcome) = &result {
            event = event.with_count(outcome.deleted);
        }
        self.audit(event);
        result
    }

    fn try_bulk_destroy(
        &self,
        descriptor: &ResourceDescriptor,
        caller: &Caller,
        ids: &[RecordId],
    ) -> AdminResult<BulkOutcome> {
        match descriptor.bulk_authorization() {
            BulkAuthorization::Blanket => {
                self.authorize(caller, descriptor, Ability::BulkDelete, None)?
            }
            BulkAuthorization::PerRecord => {
                for record in self.store.find_many(descriptor.name(), ids)? {
                    self.authorize(caller, descriptor, Ability::Delete, Some(&record))?;
                }
            }
        }

        let deletion = Deletion::new(
            descriptor.delete_policy().bulk_destroy,
            descriptor.soft_delete_field(),
        );

        let mut tx = self.store.begin()?;
        let mut outcome = BulkOutcome {
            requested: ids.len(),
            deleted: 0,
            batches: 0,
        };
        for chunk in ids.chunks(self.batch_size) {
            match tx.delete_batch(descriptor.name(), chunk, deletion) {
                Ok(deleted) => {
                    outcome.deleted += deleted;
                    outcome.batches += 1;
                }
                Err(err) => {
                    tracing::warn!(batch = outcome.batches + 1, error = %err, "bulk batch failed, rolling back");
                    if let Err(rollback) = tx.rollback() {
                        tracing::error!(error = %rollback, "bulk rollback failed");
                    }
                    return Err(AdminError::Persistence(err));
                }
            }
        }
        tx.commit()?;

        tracing::debug!(
            batches = outcome.batches,
            deleted = outcome.deleted,
            "bulk destroy committed"
        );
        Ok(outcome)
    }

    // ==================
    // Helpers
    // ==================

    /// Run a form request, then cast values to their column types
    fn validated(
        &self,
        descriptor: &ResourceDescriptor,
        rules: &RuleSet,
        input: &Value,
    ) -> AdminResult<Map<String, Value>> {
        let lookup = StoreLookup(self.store.as_ref());
        let sanitized = FormRequest::new(rules, descriptor.sanitizer()).sanitized(input, &lookup)?;
        Ok(cast_input(descriptor, sanitized)?)
    }

    fn event<T>(
        &self,
        action: AuditAction,
        descriptor: &ResourceDescriptor,
        caller: &Caller,
        result: &AdminResult<T>,
    ) -> AuditEvent {
        match result {
            Ok(_) => AuditEvent::new(action, AuditOutcome::Success, descriptor.name(), caller),
            Err(err) => {
                let outcome = if err.status_code().is_server_error() {
                    AuditOutcome::Failed
                } else {
                    AuditOutcome::Rejected
                };
                AuditEvent::new(action, outcome, descriptor.name(), caller).with_error(err.to_string())
            }
        }
    }

    fn audit(&self, event: AuditEvent) {
        self.audit.record(&event);
    }
}

fn is_hidden(descriptor: &ResourceDescriptor, record: &Record) -> bool {
    descriptor
        .hidden_marker()
        .is_some_and(|marker| record.is_marked(marker))
}

/// Cast validated values into each column's stored form
fn cast_input(
    descriptor: &ResourceDescriptor,
    values: Map<String, Value>,
) -> Result<Map<String, Value>, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut cast = Map::with_capacity(values.len());
    for (field, value) in values {
        match descriptor.field_type(&field) {
            Some(field_type) => match field_type.cast(&value) {
                Some(value) => {
                    cast.insert(field, value);
                }
                None => errors.add(
                    field.clone(),
                    format!(
                        "The {} must be a valid {}.",
                        attribute_name(&field),
                        field_type.type_name()
                    ),
                ),
            },
            None => {
                cast.insert(field, value);
            }
        }
    }
    errors.into_result(cast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::GrantTable;
    use crate::observability::MemoryAuditSink;
    use crate::resource::{DeletePolicy, FieldType, Relation};
    use crate::store::MemoryStore;
    use crate::validation::Rule;
    use serde_json::json;

    struct Fixture {
        service: AdminService,
        store: Arc<MemoryStore>,
        audit: MemoryAuditSink,
    }

    fn registry() -> ResourceRegistry {
        let mut registry = ResourceRegistry::new();
        registry
            .register(
                ResourceDescriptor::builder("city")
                    .plural("cities")
                    .field("name", FieldType::Text)
                    .listable(["id", "name"])
                    .searchable(["name"])
                    .relation(Relation::one_to_many("offices", "city_id", "office"))
                    .store_rules(RuleSet::new().field("name", [Rule::Required, Rule::String]))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
            .register(
                ResourceDescriptor::builder("office")
                    .field("phone", FieldType::Text)
                    .field("city_id", FieldType::Id)
                    .listable(["id", "phone", "city_id"])
                    .relation(Relation::many_to_one("city", "city_id", "city"))
                    .soft_delete("deleted")
                    .delete_policy(DeletePolicy::soft())
                    .hide_marked()
                    .store_rules(
                        RuleSet::new()
                            .field("phone", [Rule::Required, Rule::String, Rule::MaxLength(20)])
                            .field("city_id", [Rule::Required, Rule::exists("city")]),
                    )
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry.verify().unwrap();
        registry
    }

    fn fixture(grants: GrantTable) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let audit = MemoryAuditSink::new();
        let service = AdminService::new(Arc::new(registry()), store.clone(), Arc::new(grants))
            .with_audit(Arc::new(audit.clone()))
            .with_batch_size(2);
        Fixture {
            service,
            store,
            audit,
        }
    }

    fn admin() -> Fixture {
        fixture(GrantTable::new().grant("root", "*").unwrap())
    }

    fn root() -> Caller {
        Caller::user("root")
    }

    fn resource(f: &Fixture, plural: &str) -> Arc<ResourceDescriptor> {
        f.service.resource(plural).unwrap()
    }

    #[test]
    fn test_create_then_show_resolves_relations() {
        let f = admin();
        let cities = resource(&f, "cities");
        let offices = resource(&f, "offices");

        let riga = f.service.create(&cities, &root(), &json!({"name": "Riga"})).unwrap();
        let office = f
            .service
            .create(&offices, &root(), &json!({"phone": "+371 1", "city_id": riga.id(), "extra": 1}))
            .unwrap();
        assert!(office.get("extra").is_none());

        let shown = f.service.show(&offices, &root(), office.id()).unwrap();
        assert_eq!(shown["phone"], "+371 1");
        assert_eq!(shown["city"]["name"], "Riga");

        let city = f.service.show(&cities, &root(), riga.id()).unwrap();
        assert_eq!(city["offices"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_create_validates_before_persisting() {
        let f = admin();
        let offices = resource(&f, "offices");
        let err = f
            .service
            .create(&offices, &root(), &json!({"phone": "1", "city_id": 42}))
            .unwrap_err();
        match err {
            AdminError::Validation(errors) => {
                assert_eq!(errors.first("city_id"), Some("The selected city id is invalid."))
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(f.store.count("office").unwrap(), 0);
        assert_eq!(f.audit.events()[0].outcome, AuditOutcome::Rejected);
    }

    #[test]
    fn test_string_ids_are_cast() {
        let f = admin();
        let cities = resource(&f, "cities");
        let offices = resource(&f, "offices");
        f.service.create(&cities, &root(), &json!({"name": "Riga"})).unwrap();
        let office = f
            .service
            .create(&offices, &root(), &json!({"phone": "1", "city_id": "1"}))
            .unwrap();
        assert_eq!(office.get("city_id"), Some(&json!(1)));
    }

    #[test]
    fn test_update_is_idempotent() {
        let f = admin();
        let cities = resource(&f, "cities");
        let city = f.service.create(&cities, &root(), &json!({"name": "Riga"})).unwrap();

        let input = json!({"name": "Jurmala"});
        let first = f.service.update(&cities, &root(), city.id(), &input).unwrap();
        let second = f.service.update(&cities, &root(), city.id(), &input).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.get("name"), Some(&json!("Jurmala")));
    }

    #[test]
    fn test_update_missing_record() {
        let f = admin();
        let cities = resource(&f, "cities");
        let err = f.service.update(&cities, &root(), 5, &json!({})).unwrap_err();
        assert!(matches!(err, AdminError::NotFound { .. }));
    }

    #[test]
    fn test_soft_destroy_hides_record() {
        let f = admin();
        let cities = resource(&f, "cities");
        let offices = resource(&f, "offices");
        f.service.create(&cities, &root(), &json!({"name": "Riga"})).unwrap();
        let office = f
            .service
            .create(&offices, &root(), &json!({"phone": "1", "city_id": 1}))
            .unwrap();

        f.service.destroy(&offices, &root(), office.id()).unwrap();
        assert_eq!(f.store.count("office").unwrap(), 1);
        assert!(matches!(
            f.service.show(&offices, &root(), office.id()),
            Err(AdminError::NotFound { .. })
        ));
        let page = f.service.list(&offices, &root(), &ListParams::default()).unwrap();
        assert_eq!(page.total, 0);
        assert!(matches!(
            f.service.destroy(&offices, &root(), office.id()),
            Err(AdminError::NotFound { .. })
        ));
    }

    #[test]
    fn test_denied_list_and_create() {
        let f = fixture(GrantTable::new().grant("clerk", "admin.city.show").unwrap());
        let cities = resource(&f, "cities");
        let clerk = Caller::user("clerk");

        assert!(matches!(
            f.service.list(&cities, &clerk, &ListParams::default()),
            Err(AdminError::Authorization { permission }) if permission == "admin.city.index"
        ));
        assert!(matches!(
            f.service.create(&cities, &clerk, &json!({"name": "Riga"})),
            Err(AdminError::Authorization { .. })
        ));
        assert_eq!(f.store.count("city").unwrap(), 0);
        assert_eq!(f.audit.events()[0].outcome, AuditOutcome::Rejected);
    }

    #[test]
    fn test_bulk_destroy_batches() {
        let f = admin();
        let cities = resource(&f, "cities");
        for i in 0..5 {
            f.service
                .create(&cities, &root(), &json!({"name": format!("c{}", i)}))
                .unwrap();
        }

        let outcome = f
            .service
            .bulk_destroy(&cities, &root(), &json!({"data": {"ids": [1, 2, 3, 4, 5]}}))
            .unwrap();
        assert_eq!(
            outcome,
            BulkOutcome {
                requested: 5,
                deleted: 5,
                batches: 3
            }
        );
        assert_eq!(f.store.count("city").unwrap(), 0);

        let event = f.audit.events().pop().unwrap();
        assert_eq!(event.action, AuditAction::BulkDestroy);
        assert_eq!(event.count, Some(5));
    }

    #[test]
    fn test_bulk_destroy_validates_ids() {
        let f = admin();
        let cities = resource(&f, "cities");
        let err = f
            .service
            .bulk_destroy(&cities, &root(), &json!({"data": {"ids": []}}))
            .unwrap_err();
        assert!(matches!(err, AdminError::Validation(_)));
    }

    #[test]
    fn test_text_input_is_stored_as_given() {
        let f = admin();
        let cities = resource(&f, "cities");
        let city = f.service.create(&cities, &root(), &json!({"name": "  Riga  "})).unwrap();
        let shown = f.service.show(&cities, &root(), city.id()).unwrap();
        assert_eq!(shown["name"], "  Riga  ");
    }

    #[test]
    fn test_listing_bounds_are_clamped() {
        let f = admin();
        let cities = resource(&f, "cities");
        let service = f.service.clone().with_listing(ListingConfig {
            default_per_page: 0,
            max_per_page: 0,
        });
        service.create(&cities, &root(), &json!({"name": "Riga"})).unwrap();
        let page = service.list(&cities, &root(), &ListParams::default()).unwrap();
        assert_eq!(page.per_page, 1);
        assert_eq!(page.last_page, 1);
    }

    #[test]
    fn test_denied_update_keeps_record() {
        let f = fixture(
            GrantTable::new()
                .grant("root", "*")
                .and_then(|t| t.grant("clerk", "admin.city.show"))
                .unwrap(),
        );
        let cities = resource(&f, "cities");
        let city = f.service.create(&cities, &root(), &json!({"name": "Riga"})).unwrap();

        let err = f
            .service
            .update(&cities, &Caller::user("clerk"), city.id(), &json!({"name": "Ogre"}))
            .unwrap_err();
        assert!(matches!(err, AdminError::Authorization { permission } if permission == "admin.city.edit"));
        let shown = f.service.show(&cities, &root(), city.id()).unwrap();
        assert_eq!(shown["name"], "Riga");
        assert_eq!(f.audit.events().last().unwrap().outcome, AuditOutcome::Rejected);
    }

    #[test]
    fn test_cast_input_rejects_uncastable_values() {
        let registry = registry();
        let office = registry.get("office").unwrap();
        let values = json!({"city_id": true}).as_object().cloned().unwrap();
        let errors = cast_input(office, values).unwrap_err();
        assert_eq!(errors.first("city_id"), Some("The city id must be a valid id."));
    }
}
