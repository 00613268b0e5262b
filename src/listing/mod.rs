//! # Listing
//!
//! Paginated, filtered, searched and sorted resource listings.

pub mod filter;
pub mod params;
pub mod query;

pub use filter::{compare_values, values_equal, FilterCondition, FilterExpr, SearchClause};
pub use params::{ListParams, SortDirection};
pub use query::{ListOutcome, ListQuery, ListQueryBuilder, ListingConfig, Paginated, Sort};
