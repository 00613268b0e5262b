//! Resource descriptors
//!
//! A descriptor is everything the admin contract knows about one entity
//! type: its columns, which of them list/search/fill, its relations, its
//! validation rules, and its delete and bulk-authorization policies.
//!
//! ## Invariants
//! - searchable columns are a subset of listable columns
//! - fillable fields never include the primary key or the soft-delete marker
//! - a soft delete policy always has a marker column
//! - a resource that hides marked rows does not list its marker

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::errors::{ResourceError, ResourceResult};
use super::field::{FieldDef, FieldType};
use super::record::PRIMARY_KEY;
use super::relation::{Cardinality, Relation};
use crate::validation::{KeepInput, RuleSet, Sanitizer};

/// How a delete is carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMode {
    /// Set the soft-delete marker; the row stays
    Soft,
    /// Remove the row
    Hard,
}

/// Delete mode per operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletePolicy {
    pub destroy: DeleteMode,
    pub bulk_destroy: DeleteMode,
}

impl DeletePolicy {
    pub fn hard() -> Self {
        Self {
            destroy: DeleteMode::Hard,
            bulk_destroy: DeleteMode::Hard,
        }
    }

    pub fn soft() -> Self {
        Self {
            destroy: DeleteMode::Soft,
            bulk_destroy: DeleteMode::Soft,
        }
    }

    fn uses_soft(&self) -> bool {
        self.destroy == DeleteMode::Soft || self.bulk_destroy == DeleteMode::Soft
    }
}

impl Default for DeletePolicy {
    fn default() -> Self {
        Self::hard()
    }
}

/// How bulk destroy is authorized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAuthorization {
    /// One `bulk-delete` check for the whole request
    #[default]
    Blanket,
    /// A `delete` check against every target record before any batch runs
    PerRecord,
}

/// Everything known about one resource
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    name: String,
    plural: String,
    fields: Vec<FieldDef>,
    listable: Vec<String>,
    searchable: Vec<String>,
    fillable: Vec<String>,
    relations: Vec<Relation>,
    soft_delete_field: Option<String>,
    hide_marked: bool,
    owner_field: Option<String>,
    delete_policy: DeletePolicy,
    bulk_authorization: BulkAuthorization,
    store_rules: RuleSet,
    update_rules: RuleSet,
    sanitizer: Arc<dyn Sanitizer>,
}

impl ResourceDescriptor {
    pub fn builder(name: impl Into<String>) -> ResourceBuilder {
        ResourceBuilder::new(name)
    }

    /// Singular name, used in permission names and templates (`ticket`)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Plural name, used in URLs (`tickets`)
    pub fn plural(&self) -> &str {
        &self.plural
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field_type(&self, field: &str) -> Option<FieldType> {
        self.fields
            .iter()
            .find(|f| f.name == field)
            .map(|f| f.field_type)
    }

    pub fn listable(&self) -> &[String] {
        &self.listable
    }

    pub fn is_listable(&self, column: &str) -> bool {
        self.listable.iter().any(|c| c == column)
    }

    pub fn searchable(&self) -> &[String] {
        &self.searchable
    }

    pub fn fillable(&self) -> &[String] {
        &self.fillable
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.name == name)
    }

    pub fn soft_delete_field(&self) -> Option<&str> {
        self.soft_delete_field.as_deref()
    }

    /// Marker column whose set rows are hidden from list, show and edit.
    /// Only present when the resource declares `hide_marked`.
    pub fn hidden_marker(&self) -> Option<&str> {
        if self.hide_marked {
            self.soft_delete_field()
        } else {
            None
        }
    }

    pub fn owner_field(&self) -> Option<&str> {
        self.owner_field.as_deref()
    }

    pub fn delete_policy(&self) -> DeletePolicy {
        self.delete_policy
    }

    pub fn bulk_authorization(&self) -> BulkAuthorization {
        self.bulk_authorization
    }

    pub fn store_rules(&self) -> &RuleSet {
        &self.store_rules
    }

    pub fn update_rules(&self) -> &RuleSet {
        &self.update_rules
    }

    pub fn sanitizer(&self) -> &dyn Sanitizer {
        self.sanitizer.as_ref()
    }

    /// Template name for page-mode views (`admin.ticket.index`)
    pub fn template(&self, action: &str) -> String {
        format!("admin.{}.{}", self.name, action)
    }

    /// Index URL used for redirects (`admin/tickets`)
    pub fn index_url(&self) -> String {
        format!("admin/{}", self.plural)
    }
}

/// Builder for `ResourceDescriptor`
#[derive(Debug)]
pub struct ResourceBuilder {
    name: String,
    plural: Option<String>,
    fields: Vec<FieldDef>,
    listable: Vec<String>,
    searchable: Vec<String>,
    fillable: Option<Vec<String>>,
    relations: Vec<Relation>,
    soft_delete_field: Option<String>,
    hide_marked: bool,
    owner_field: Option<String>,
    delete_policy: DeletePolicy,
    bulk_authorization: BulkAuthorization,
    store_rules: RuleSet,
    update_rules: Option<RuleSet>,
    sanitizer: Arc<dyn Sanitizer>,
}

impl ResourceBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plural: None,
            fields: vec![FieldDef::new(PRIMARY_KEY, FieldType::Id)],
            listable: Vec::new(),
            searchable: Vec::new(),
            fillable: None,
            relations: Vec::new(),
            soft_delete_field: None,
            hide_marked: false,
            owner_field: None,
            delete_policy: DeletePolicy::default(),
            bulk_authorization: BulkAuthorization::default(),
            store_rules: RuleSet::new(),
            update_rules: None,
            sanitizer: Arc::new(KeepInput),
        }
    }

    /// Defaults to the name with an `s` appended
    pub fn plural(mut self, plural: impl Into<String>) -> Self {
        self.plural = Some(plural.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldDef::new(name, field_type));
        self
    }

    /// `id` is always listed first, even if omitted here
    pub fn listable<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.listable = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn searchable<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.searchable = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Defaults to every declared field except the system-managed ones
    pub fn fillable<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fillable = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    /// Declare a boolean soft-delete marker column
    pub fn soft_delete(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        if !self.fields.iter().any(|f| f.name == field) {
            self.fields.push(FieldDef::new(field.clone(), FieldType::Boolean));
        }
        self.soft_delete_field = Some(field);
        self
    }

    /// Treat rows with the soft-delete marker set as gone: list, show,
    /// edit, update and destroy no longer see them
    pub fn hide_marked(mut self) -> Self {
        self.hide_marked = true;
        self
    }

    /// Record-scoped checks also require this column to equal the caller
    pub fn owner_field(mut self, field: impl Into<String>) -> Self {
        self.owner_field = Some(field.into());
        self
    }

    pub fn delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    pub fn bulk_authorization(mut self, mode: BulkAuthorization) -> Self {
        self.bulk_authorization = mode;
        self
    }

    pub fn store_rules(mut self, rules: RuleSet) -> Self {
        self.store_rules = rules;
        self
    }

    /// Defaults to the store rules with every field made optional
    pub fn update_rules(mut self, rules: RuleSet) -> Self {
        self.update_rules = Some(rules);
        self
    }

    pub fn sanitizer(mut self, sanitizer: Arc<dyn Sanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn build(self) -> ResourceResult<ResourceDescriptor> {
        let name = self.name;
        let unknown = |column: &str| ResourceError::UnknownColumn {
            resource: name.clone(),
            column: column.to_string(),
        };

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(ResourceError::DuplicateField {
                    resource: name.clone(),
                    field: field.name.clone(),
                });
            }
        }

        let mut listable = self.listable;
        if !listable.iter().any(|c| c == PRIMARY_KEY) {
            listable.insert(0, PRIMARY_KEY.to_string());
        }
        if let Some(column) = listable.iter().find(|c| !seen.contains(c.as_str())) {
            return Err(unknown(column));
        }

        if let Some(column) = self.searchable.iter().find(|c| !listable.contains(c)) {
            return Err(ResourceError::SearchableNotListable {
                resource: name.clone(),
                column: column.clone(),
            });
        }

        let system: Vec<&str> = std::iter::once(PRIMARY_KEY)
            .chain(self.soft_delete_field.as_deref())
            .collect();
        let fillable = match self.fillable {
            Some(fillable) => fillable,
            None => self
                .fields
                .iter()
                .map(|f| f.name.clone())
                .filter(|f| !system.contains(&f.as_str()))
                .collect(),
        };
        for field in &fillable {
            if system.contains(&field.as_str()) {
                return Err(ResourceError::SystemFieldFillable {
                    resource: name.clone(),
                    field: field.clone(),
                });
            }
            if !seen.contains(field.as_str()) {
                return Err(unknown(field));
            }
        }

        if (self.delete_policy.uses_soft() || self.hide_marked) && self.soft_delete_field.is_none() {
            return Err(ResourceError::MissingSoftDeleteField {
                resource: name.clone(),
            });
        }
        if let Some(marker) = self.soft_delete_field.as_ref().filter(|_| self.hide_marked) {
            if listable.contains(marker) {
                return Err(ResourceError::HiddenMarkerListable {
                    resource: name.clone(),
                    field: marker.clone(),
                });
            }
        }

        for relation in &self.relations {
            if relation.cardinality == Cardinality::ManyToOne
                && !seen.contains(relation.foreign_key.as_str())
            {
                return Err(unknown(&relation.foreign_key));
            }
        }

        if let Some(owner) = &self.owner_field {
            if !seen.contains(owner.as_str()) {
                return Err(unknown(owner));
            }
        }

        let update_rules = self
            .update_rules
            .unwrap_or_else(|| self.store_rules.sometimes());
        for rules in [&self.store_rules, &update_rules] {
            if let Some(field) = rules.fields().iter().find(|f| !fillable.contains(&f.field)) {
                return Err(ResourceError::RuleForNonFillable {
                    resource: name.clone(),
                    field: field.field.clone(),
                });
            }
        }

        let plural = self.plural.unwrap_or_else(|| format!("{}s", name));

        Ok(ResourceDescriptor {
            name,
            plural,
            fields: self.fields,
            listable,
            searchable: self.searchable,
            fillable,
            relations: self.relations,
            soft_delete_field: self.soft_delete_field,
            hide_marked: self.hide_marked,
            owner_field: self.owner_field,
            delete_policy: self.delete_policy,
            bulk_authorization: self.bulk_authorization,
            store_rules: self.store_rules,
            update_rules,
            sanitizer: self.sanitizer,
        })
    }
}
