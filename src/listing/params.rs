//! # List Request Parameters
//!
//! Parses listing query parameters:
//! - `page`, `per_page`: pagination
//! - `orderBy`, `orderDirection`: sort
//! - `search`: free-text term
//! - `bulk`: ask for primary keys only
//! - anything else: a per-column filter

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::validation::{ValidationErrors, ValidationResult};

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Raw listing parameters, before they are checked against a resource
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub order_by: Option<String>,
    pub order_direction: Option<SortDirection>,
    pub search: Option<String>,
    pub bulk: bool,
    /// Column -> raw filter text
    pub filters: BTreeMap<String, String>,
}

impl ListParams {
    /// Parse query parameters from a HashMap
    pub fn parse(params: &HashMap<String, String>) -> ValidationResult<Self> {
        let mut result = ListParams::default();
        let mut errors = ValidationErrors::new();

        for (key, value) in params {
            match key.as_str() {
                "page" => match parse_integer(value) {
                    Some(page) => result.page = Some(page),
                    None => errors.add("page", "The page must be an integer."),
                },
                "per_page" => match parse_integer(value) {
                    Some(per_page) => result.per_page = Some(per_page),
                    None => errors.add("per_page", "The per page must be an integer."),
                },
                "orderBy" => {
                    if !value.trim().is_empty() {
                        result.order_by = Some(value.trim().to_string());
                    }
                }
                "orderDirection" => {
                    if !value.trim().is_empty() {
                        match SortDirection::parse(value.trim()) {
                            Some(direction) => result.order_direction = Some(direction),
                            None => errors.add(
                                "orderDirection",
                                "The order direction must be asc or desc.",
                            ),
                        }
                    }
                }
                "search" => result.search = Some(value.clone()),
                "bulk" => result.bulk = true,
                _ => {
                    if !value.is_empty() {
                        result.filters.insert(key.clone(), value.clone());
                    }
                }
            }
        }

        errors.into_result(result)
    }
}

fn parse_integer(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}
