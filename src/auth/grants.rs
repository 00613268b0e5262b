//! Static grant table
//!
//! Maps caller ids to permission patterns. A pattern is an exact permission
//! name, or a prefix ending in `*` (`admin.ticket.*`, `*`). Anonymous
//! callers are never granted anything.

use std::collections::{BTreeMap, HashMap};

use super::caller::Caller;
use super::errors::{AuthError, AuthResult};
use super::permission::{Permission, PermissionService};
use crate::resource::Record;

#[derive(Debug, Clone, PartialEq, Eq)]
enum GrantPattern {
    Exact(String),
    Prefix(String),
}

impl GrantPattern {
    fn parse(caller: &str, pattern: &str) -> AuthResult<Self> {
        let pattern = pattern.trim();
        let invalid = || AuthError::InvalidGrant {
            caller: caller.to_string(),
            pattern: pattern.to_string(),
        };
        if pattern.is_empty() {
            return Err(invalid());
        }
        match pattern.strip_suffix('*') {
            Some(prefix) if !prefix.contains('*') => Ok(GrantPattern::Prefix(prefix.to_string())),
            Some(_) => Err(invalid()),
            None if pattern.contains('*') => Err(invalid()),
            None => Ok(GrantPattern::Exact(pattern.to_string())),
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            GrantPattern::Exact(exact) => exact == name,
            GrantPattern::Prefix(prefix) => name.starts_with(prefix.as_str()),
        }
    }
}

/// Permission service backed by a fixed caller -> patterns table
#[derive(Debug, Clone, Default)]
pub struct GrantTable {
    grants: HashMap<String, Vec<GrantPattern>>,
}

impl GrantTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `grants` section of the config file
    pub fn from_config(grants: &BTreeMap<String, Vec<String>>) -> AuthResult<Self> {
        let mut table = Self::new();
        for (caller, patterns) in grants {
            for pattern in patterns {
                table = table.grant(caller, pattern)?;
            }
        }
        Ok(table)
    }

    pub fn grant(mut self, caller: &str, pattern: &str) -> AuthResult<Self> {
        let caller = caller.trim();
        if caller.is_empty() {
            return Err(AuthError::EmptyCaller);
        }
        let pattern = GrantPattern::parse(caller, pattern)?;
        self.grants.entry(caller.to_string()).or_default().push(pattern);
        Ok(self)
    }

    /// Whether `caller` holds a pattern matching `name`
    pub fn grants(&self, caller: &Caller, name: &str) -> bool {
        caller
            .id()
            .and_then(|id| self.grants.get(id))
            .is_some_and(|patterns| patterns.iter().any(|p| p.matches(name)))
    }
}

impl PermissionService for GrantTable {
    fn allows(&self, caller: &Caller, permission: &Permission, _record: Option<&Record>) -> bool {
        self.grants(caller, &permission.to_string())
    }
}
