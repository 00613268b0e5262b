//! Relations between resources
//!
//! Relations are foreign-key references resolved on demand; no record
//! embeds another resource's record.

use serde::{Deserialize, Serialize};

/// Relation cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// Foreign key on this resource points at one target record
    ManyToOne,
    /// Foreign key on the target resource points back at this record
    OneToMany,
}

/// A named relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub name: String,
    pub foreign_key: String,
    pub target: String,
    pub cardinality: Cardinality,
}

impl Relation {
    /// `foreign_key` lives on this resource (e.g. Office -> City via `city_id`)
    pub fn many_to_one(
        name: impl Into<String>,
        foreign_key: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            foreign_key: foreign_key.into(),
            target: target.into(),
            cardinality: Cardinality::ManyToOne,
        }
    }

    /// `foreign_key` lives on the target (e.g. City -> Office via `city_id`)
    pub fn one_to_many(
        name: impl Into<String>,
        foreign_key: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            foreign_key: foreign_key.into(),
            target: target.into(),
            cardinality: Cardinality::OneToMany,
        }
    }
}
