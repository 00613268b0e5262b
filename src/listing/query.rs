//! # List Queries
//!
//! `ListQueryBuilder` checks raw `ListParams` against a resource descriptor
//! and produces a typed `ListQuery`. Stores either translate the query to
//! their own engine or hand their rows to `ListQuery::execute`.
//!
//! Pipeline order: filter, hide soft-marked rows, search, count, sort,
//! paginate, project.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::filter::{compare_values, FilterExpr, SearchClause};
use super::params::{ListParams, SortDirection};
use crate::resource::{Record, RecordId, ResourceDescriptor, PRIMARY_KEY};
use crate::validation::{ValidationErrors, ValidationResult};

/// Page size bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    #[serde(default = "default_per_page")]
    pub default_per_page: u64,
    #[serde(default = "default_max_per_page")]
    pub max_per_page: u64,
}

fn default_per_page() -> u64 {
    10
}

fn default_max_per_page() -> u64 {
    100
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_per_page: default_per_page(),
            max_per_page: default_max_per_page(),
        }
    }
}

/// Sort specification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sort {
    pub column: String,
    pub direction: SortDirection,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            column: PRIMARY_KEY.to_string(),
            direction: SortDirection::Asc,
        }
    }
}

/// A checked, typed listing query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListQuery {
    pub filters: Vec<FilterExpr>,
    pub search: Option<SearchClause>,
    pub sort: Sort,
    /// 1-based
    pub page: u64,
    pub per_page: u64,
    /// Projection, in output order
    pub columns: Vec<String>,
    /// Rows with this marker set are excluded
    pub hide_marked: Option<String>,
}

/// Rows of one page plus the count before pagination
#[derive(Debug, Clone, PartialEq)]
pub struct ListOutcome {
    pub records: Vec<Record>,
    pub total: u64,
}

impl ListQuery {
    /// Number of rows skipped before this page
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    /// Whether a row passes filters, marker and search
    pub fn matches(&self, record: &Record) -> bool {
        if let Some(marker) = &self.hide_marked {
            if record.is_marked(marker) {
                return false;
            }
        }
        if !self.filters.iter().all(|f| f.matches(record)) {
            return false;
        }
        self.search.as_ref().map_or(true, |s| s.matches(record))
    }

    /// Run the query over an unordered set of rows
    pub fn execute<'a, I>(&self, records: I) -> ListOutcome
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut matched: Vec<&Record> = records.into_iter().filter(|r| self.matches(r)).collect();
        let total = matched.len() as u64;

        matched.sort_by(|a, b| self.compare(a, b));

        let records = matched
            .into_iter()
            .skip(usize::try_from(self.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(self.per_page).unwrap_or(usize::MAX))
            .map(|r| r.project(&self.columns))
            .collect();

        ListOutcome { records, total }
    }

    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let a_value = a.get(&self.sort.column).unwrap_or(&Value::Null);
        let b_value = b.get(&self.sort.column).unwrap_or(&Value::Null);
        let ordering = match self.sort.direction {
            SortDirection::Asc => compare_values(a_value, b_value),
            SortDirection::Desc => compare_values(b_value, a_value),
        };
        ordering.then_with(|| a.id().cmp(&b.id()))
    }
}

/// One page of a listing, with pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated {
    pub data: Vec<Record>,
    pub total: u64,
    pub current_page: u64,
    pub per_page: u64,
    pub last_page: u64,
    /// 1-based position of the first row on this page
    pub from: Option<u64>,
    pub to: Option<u64>,
}

impl Paginated {
    pub fn new(query: &ListQuery, outcome: ListOutcome) -> Self {
        let last_page = outcome.total.div_ceil(query.per_page).max(1);
        let (from, to) = if outcome.records.is_empty() {
            (None, None)
        } else {
            let from = query.offset() + 1;
            (Some(from), Some(from + outcome.records.len() as u64 - 1))
        };
        Self {
            data: outcome.records,
            total: outcome.total,
            current_page: query.page,
            per_page: query.per_page,
            last_page,
            from,
            to,
        }
    }

    /// Primary keys of this page, in page order
    pub fn ids(&self) -> Vec<RecordId> {
        self.data.iter().map(Record::id).collect()
    }
}

/// Builds a `ListQuery` for one resource
pub struct ListQueryBuilder<'a> {
    descriptor: &'a ResourceDescriptor,
    config: &'a ListingConfig,
}

impl<'a> ListQueryBuilder<'a> {
    pub fn new(descriptor: &'a ResourceDescriptor, config: &'a ListingConfig) -> Self {
        Self { descriptor, config }
    }

    pub fn build(&self, params: &ListParams) -> ValidationResult<ListQuery> {
        let mut errors = ValidationErrors::new();

        let page = match params.page {
            None => 1,
            Some(page) if page >= 1 => page as u64,
            Some(_) => {
                errors.add("page", "The page must be at least 1.");
                1
            }
        };

        let max = self.config.max_per_page;
        let per_page = match params.per_page {
            None => self.config.default_per_page,
            Some(per_page) if per_page < 1 => {
                errors.add("per_page", "The per page must be at least 1.");
                self.config.default_per_page
            }
            Some(per_page) if per_page as u64 > max => {
                errors.add(
                    "per_page",
                    format!("The per page may not be greater than {}.", max),
                );
                self.config.default_per_page
            }
            Some(per_page) => per_page as u64,
        };

        let mut sort = Sort::default();
        if let Some(column) = &params.order_by {
            if self.descriptor.is_listable(column) {
                sort.column = column.clone();
            } else {
                errors.add("orderBy", "The selected order by is invalid.");
            }
        }
        sort.direction = params.order_direction.unwrap_or_default();

        let mut filters = Vec::new();
        for (column, raw) in &params.filters {
            if !self.descriptor.is_listable(column) {
                continue;
            }
            let Some(field_type) = self.descriptor.field_type(column) else {
                continue;
            };
            match FilterExpr::parse(column, field_type, raw) {
                Some(filter) => filters.push(filter),
                None => errors.add(column.clone(), format!("The {} filter is invalid.", column)),
            }
        }

        let search = params
            .search
            .as_deref()
            .and_then(|term| SearchClause::new(self.descriptor.searchable(), term));

        errors.into_result(ListQuery {
            filters,
            search,
            sort,
            page,
            per_page,
            columns: self.descriptor.listable().to_vec(),
            hide_marked: self.descriptor.hidden_marker().map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{DeletePolicy, FieldType};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn office() -> ResourceDescriptor {
        ResourceDescriptor::builder("office")
            .field("phone", FieldType::Text)
            .field("address", FieldType::Text)
            .field("city_id", FieldType::Id)
            .field("notes", FieldType::Text)
            .listable(["id", "phone", "address", "city_id"])
            .searchable(["phone", "address"])
            .soft_delete("deleted")
            .delete_policy(DeletePolicy::soft())
            .hide_marked()
            .build()
            .unwrap()
    }

    fn rows() -> Vec<Record> {
        let data = [
            (1, json!({"phone": "111", "address": "Brivibas 1", "city_id": 1, "notes": "x"})),
            (2, json!({"phone": "222", "address": "Elizabetes 2", "city_id": 2})),
            (3, json!({"phone": "333", "address": "brivibas 9", "city_id": 1})),
            (4, json!({"phone": "444", "address": "Marijas 4", "city_id": 1, "deleted": true})),
            (5, json!({"phone": "111", "address": "Valnu 5", "city_id": 3})),
        ];
        data.into_iter()
            .map(|(id, v)| Record::new(id, v.as_object().cloned().unwrap()))
            .collect()
    }

    fn build(params: ListParams) -> ValidationResult<ListQuery> {
        let descriptor = office();
        let config = ListingConfig::default();
        ListQueryBuilder::new(&descriptor, &config).build(&params)
    }

    #[test]
    fn test_defaults() {
        let query = build(ListParams::default()).unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.per_page, 10);
        assert_eq!(query.sort, Sort::default());
        assert_eq!(query.hide_marked.as_deref(), Some("deleted"));

        let outcome = query.execute(&rows());
        assert_eq!(outcome.total, 4);
        let ids: Vec<_> = outcome.records.iter().map(Record::id).collect();
        assert_eq!(ids, vec![1, 2, 3, 5]);
    }

    #[test]
    fn test_projection_drops_unlisted_columns() {
        let outcome = build(ListParams::default()).unwrap().execute(&rows());
        let first = &outcome.records[0];
        let keys: Vec<_> = first.values().keys().cloned().collect();
        assert_eq!(keys, vec!["id", "phone", "address", "city_id"]);
        assert!(first.get("notes").is_none());
    }

    #[test]
    fn test_search_and_filter_combine() {
        let mut filters = BTreeMap::new();
        filters.insert("city_id".to_string(), "1".to_string());
        let query = build(ListParams {
            search: Some("BRIVIBAS".to_string()),
            filters,
            ..Default::default()
        })
        .unwrap();

        let outcome = query.execute(&rows());
        assert_eq!(outcome.total, 2);
        let ids: Vec<_> = outcome.records.iter().map(Record::id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_sort_ties_break_on_primary_key() {
        let query = build(ListParams {
            order_by: Some("phone".to_string()),
            order_direction: Some(SortDirection::Desc),
            ..Default::default()
        })
        .unwrap();
        let ids: Vec<_> = query.execute(&rows()).records.iter().map(Record::id).collect();
        assert_eq!(ids, vec![3, 2, 1, 5]);
    }

    #[test]
    fn test_pagination_metadata() {
        let query = build(ListParams {
            page: Some(2),
            per_page: Some(3),
            ..Default::default()
        })
        .unwrap();
        let page = Paginated::new(&query, query.execute(&rows()));
        assert_eq!(page.total, 4);
        assert_eq!(page.last_page, 2);
        assert_eq!(page.ids(), vec![5]);
        assert_eq!(page.from, Some(4));
        assert_eq!(page.to, Some(4));
    }

    #[test]
    fn test_page_past_the_end_is_empty() {
        let query = build(ListParams {
            page: Some(9),
            ..Default::default()
        })
        .unwrap();
        let page = Paginated::new(&query, query.execute(&rows()));
        assert!(page.data.is_empty());
        assert_eq!(page.total, 4);
        assert_eq!(page.from, None);
    }

    #[test]
    fn test_out_of_bounds_pagination() {
        let errors = build(ListParams {
            page: Some(0),
            per_page: Some(101),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(errors.first("page"), Some("The page must be at least 1."));
        assert_eq!(
            errors.first("per_page"),
            Some("The per page may not be greater than 100.")
        );

        let errors = build(ListParams {
            per_page: Some(0),
            ..Default::default()
        })
        .unwrap_err();
        assert!(errors.has("per_page"));
    }

    #[test]
    fn test_sort_column_must_be_listable() {
        let errors = build(ListParams {
            order_by: Some("notes".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(errors.first("orderBy"), Some("The selected order by is invalid."));
    }

    #[test]
    fn test_unknown_filter_keys_are_ignored() {
        let mut filters = BTreeMap::new();
        filters.insert("notes".to_string(), "x".to_string());
        filters.insert("color".to_string(), "red".to_string());
        let query = build(ListParams {
            filters,
            ..Default::default()
        })
        .unwrap();
        assert!(query.filters.is_empty());
    }

    #[test]
    fn test_bad_filter_value() {
        let mut filters = BTreeMap::new();
        filters.insert("city_id".to_string(), "riga".to_string());
        let errors = build(ListParams {
            filters,
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(errors.first("city_id"), Some("The city_id filter is invalid."));
    }

    #[test]
    fn test_empty_search_returns_everything() {
        let query = build(ListParams {
            search: Some("".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(query.search.is_none());
        assert_eq!(query.execute(&rows()).total, 4);
    }
}
