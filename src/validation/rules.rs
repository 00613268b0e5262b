//! Declarative validation rules
//!
//! A `RuleSet` lists the rules for each accepted field. Evaluation stops at
//! the first failing rule for a field; other fields are still checked.

use regex::Regex;
use serde_json::Value;

use crate::resource::field::{parse_bool, parse_date};
use crate::resource::record::RecordId;

/// A single rule
#[derive(Debug, Clone)]
pub enum Rule {
    /// Must be present and non-empty
    Required,
    /// Only validated when present in the input
    Sometimes,
    /// `null` is accepted and skips the remaining rules
    Nullable,
    /// Must be a string
    String,
    /// Must be an integer (number or numeric string)
    Integer,
    /// Must be numeric (number or numeric string)
    Numeric,
    /// Must be true/false/1/0
    Boolean,
    /// Must be a parseable date
    Date,
    /// Must match a chrono format string, e.g. `%H:%M:%S`
    DateFormat(String),
    /// Numeric lower bound (inclusive)
    Min(f64),
    /// Numeric upper bound (inclusive)
    Max(f64),
    /// Maximum string length in characters
    MaxLength(usize),
    /// Must match the pattern
    Pattern(Regex),
    /// Must be the id of an existing record of the named resource
    Exists(String),
}

impl Rule {
    pub fn date_format(format: impl Into<String>) -> Self {
        Rule::DateFormat(format.into())
    }

    pub fn exists(resource: impl Into<String>) -> Self {
        Rule::Exists(resource.into())
    }

    /// Compile a pattern rule
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Rule::Pattern)
    }

    /// Rule name as written in rule listings
    pub fn name(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Sometimes => "sometimes",
            Rule::Nullable => "nullable",
            Rule::String => "string",
            Rule::Integer => "integer",
            Rule::Numeric => "numeric",
            Rule::Boolean => "boolean",
            Rule::Date => "date",
            Rule::DateFormat(_) => "date_format",
            Rule::Min(_) => "min",
            Rule::Max(_) => "max",
            Rule::MaxLength(_) => "max_length",
            Rule::Pattern(_) => "regex",
            Rule::Exists(_) => "exists",
        }
    }

    fn is_modifier(&self) -> bool {
        matches!(self, Rule::Required | Rule::Sometimes | Rule::Nullable)
    }
}

/// Rules for one field
#[derive(Debug, Clone)]
pub struct FieldRules {
    pub field: String,
    pub rules: Vec<Rule>,
}

impl FieldRules {
    fn has(&self, probe: fn(&Rule) -> bool) -> bool {
        self.rules.iter().any(probe)
    }

    pub fn is_required(&self) -> bool {
        self.has(|r| matches!(r, Rule::Required))
    }

    /// Resource names referenced by `exists` rules
    pub fn exists_targets(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().filter_map(|r| match r {
            Rule::Exists(target) => Some(target.as_str()),
            _ => None,
        })
    }
}

/// Rules for every accepted field, in declaration order
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    fields: Vec<FieldRules>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the rules for `field`
    pub fn field(mut self, field: impl Into<String>, rules: impl IntoIterator<Item = Rule>) -> Self {
        let field = field.into();
        let rules: Vec<Rule> = rules.into_iter().collect();
        match self.fields.iter_mut().find(|f| f.field == field) {
            Some(existing) => existing.rules = rules,
            None => self.fields.push(FieldRules { field, rules }),
        }
        self
    }

    /// The same rules, each field only checked when present.
    ///
    /// Used to derive update rules from store rules.
    pub fn sometimes(&self) -> Self {
        let fields = self
            .fields
            .iter()
            .map(|f| {
                let mut rules = Vec::with_capacity(f.rules.len() + 1);
                rules.push(Rule::Sometimes);
                rules.extend(
                    f.rules
                        .iter()
                        .filter(|r| !matches!(r, Rule::Sometimes))
                        .cloned(),
                );
                FieldRules {
                    field: f.field.clone(),
                    rules,
                }
            })
            .collect();
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldRules] {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&FieldRules> {
        self.fields.iter().find(|f| f.field == field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Outcome of checking one field
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FieldCheck {
    /// Field absent and allowed to be: leave it out of the validated input
    Skip,
    /// Field passed: keep it in the validated input
    Pass,
    /// Field failed with a message
    Fail(String),
    /// Field needs an `exists` lookup before it passes
    Lookup { resource: String, id: RecordId },
}

/// Check a field against everything except the store lookup.
pub(crate) fn check_field(rules: &FieldRules, value: Option<&Value>) -> FieldCheck {
    let attribute = attribute_name(&rules.field);

    let Some(value) = value else {
        if rules.is_required() && !rules.has(|r| matches!(r, Rule::Sometimes)) {
            return FieldCheck::Fail(format!("The {} field is required.", attribute));
        }
        return FieldCheck::Skip;
    };

    if is_empty(value) {
        if rules.is_required() {
            return FieldCheck::Fail(format!("The {} field is required.", attribute));
        }
        if rules.has(|r| matches!(r, Rule::Nullable)) {
            return FieldCheck::Pass;
        }
    }

    let mut lookup = None;
    for rule in rules.rules.iter().filter(|r| !r.is_modifier()) {
        if let Err(message) = check_rule(rule, value, &attribute) {
            return FieldCheck::Fail(message);
        }
        if let Rule::Exists(resource) = rule {
            match value_as_id(value) {
                Some(id) => lookup = Some((resource.clone(), id)),
                None => return FieldCheck::Fail(format!("The selected {} is invalid.", attribute)),
            }
        }
    }

    match lookup {
        Some((resource, id)) => FieldCheck::Lookup { resource, id },
        None => FieldCheck::Pass,
    }
}

fn check_rule(rule: &Rule, value: &Value, attribute: &str) -> Result<(), String> {
    let ok = match rule {
        Rule::Required | Rule::Sometimes | Rule::Nullable | Rule::Exists(_) => true,
        Rule::String => value.is_string(),
        Rule::Integer => value_as_i64(value).is_some(),
        Rule::Numeric => value_as_f64(value).is_some(),
        Rule::Boolean => match value {
            Value::Bool(_) => true,
            Value::Number(n) => matches!(n.as_i64(), Some(0) | Some(1)),
            Value::String(s) => parse_bool(s).is_some(),
            _ => false,
        },
        Rule::Date => value.as_str().and_then(parse_date).is_some(),
        Rule::DateFormat(format) => value.as_str().is_some_and(|s| matches_format(s, format)),
        Rule::Min(min) => value_as_f64(value).map_or(true, |n| n >= *min),
        Rule::Max(max) => value_as_f64(value).map_or(true, |n| n <= *max),
        Rule::MaxLength(max) => value.as_str().map_or(true, |s| s.chars().count() <= *max),
        Rule::Pattern(re) => value.as_str().is_some_and(|s| re.is_match(s)),
    };
    if ok {
        return Ok(());
    }

    Err(match rule {
        Rule::String => format!("The {} must be a string.", attribute),
        Rule::Integer => format!("The {} must be an integer.", attribute),
        Rule::Numeric => format!("The {} must be a number.", attribute),
        Rule::Boolean => format!("The {} field must be true or false.", attribute),
        Rule::Date => format!("The {} is not a valid date.", attribute),
        Rule::DateFormat(format) => {
            format!("The {} does not match the format {}.", attribute, format)
        }
        Rule::Min(min) => format!("The {} must be at least {}.", attribute, min),
        Rule::Max(max) => format!("The {} may not be greater than {}.", attribute, max),
        Rule::MaxLength(max) => format!(
            "The {} may not be greater than {} characters.",
            attribute, max
        ),
        Rule::Pattern(_) => format!("The {} format is invalid.", attribute),
        Rule::Required | Rule::Sometimes | Rule::Nullable | Rule::Exists(_) => {
            format!("The {} is invalid.", attribute)
        }
    })
}

fn matches_format(value: &str, format: &str) -> bool {
    chrono::NaiveTime::parse_from_str(value, format).is_ok()
        || chrono::NaiveDate::parse_from_str(value, format).is_ok()
        || chrono::NaiveDateTime::parse_from_str(value, format).is_ok()
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// `city_id` -> `city id`
pub fn attribute_name(field: &str) -> String {
    field.replace('_', " ")
}

pub(crate) fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

pub(crate) fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

pub(crate) fn value_as_id(value: &Value) -> Option<RecordId> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<RecordId>().ok(),
        _ => None,
    }
}
