//! Permission names and the permission-service seam
//!
//! Every admin action is gated by a permission named
//! `admin.<resource>.<ability>`.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::caller::Caller;
use super::errors::AuthError;
use crate::resource::Record;

/// Action being authorized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ability {
    Index,
    Create,
    Show,
    Edit,
    Delete,
    BulkDelete,
}

impl Ability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ability::Index => "index",
            Ability::Create => "create",
            Ability::Show => "show",
            Ability::Edit => "edit",
            Ability::Delete => "delete",
            Ability::BulkDelete => "bulk-delete",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "index" => Some(Ability::Index),
            "create" => Some(Ability::Create),
            "show" => Some(Ability::Show),
            "edit" => Some(Ability::Edit),
            "delete" => Some(Ability::Delete),
            "bulk-delete" => Some(Ability::BulkDelete),
            _ => None,
        }
    }
}

/// A named permission, `admin.<resource>.<ability>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Permission {
    pub resource: String,
    pub ability: Ability,
}

impl Permission {
    pub fn new(resource: impl Into<String>, ability: Ability) -> Self {
        Self {
            resource: resource.into(),
            ability,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "admin.{}.{}", self.resource, self.ability.as_str())
    }
}

impl FromStr for Permission {
    type Err = AuthError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let invalid = || AuthError::InvalidPermission(name.to_string());
        let rest = name.strip_prefix("admin.").ok_or_else(invalid)?;
        let (resource, ability) = rest.split_once('.').ok_or_else(invalid)?;
        if resource.is_empty() {
            return Err(invalid());
        }
        let ability = Ability::parse(ability).ok_or_else(invalid)?;
        Ok(Permission::new(resource, ability))
    }
}

/// Answers permission checks. Record-scoped checks pass the target record.
pub trait PermissionService: Send + Sync {
    fn allows(&self, caller: &Caller, permission: &Permission, record: Option<&Record>) -> bool;
}
