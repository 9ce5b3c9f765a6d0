//! Declarative field rules and the ordered rule table.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use super::coerce::coerce;
use super::evaluator::check_constraint;
use crate::error::CoreError;

/// Error code reported when the candidate itself is not a record.
pub const INVALID_INPUT: &str = "INVALID_INPUT";

/// Canonical type a field is coerced to before its constraints run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Integer,
    Boolean,
    Timestamp,
    Url,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Integer => "integer",
            FieldKind::Boolean => "boolean",
            FieldKind::Timestamp => "timestamp",
            FieldKind::Url => "url",
        }
    }
}

/// How a field behaves when the candidate does not supply it.
///
/// `null`, an absent key and a blank string all count as "not supplied".
#[derive(Debug, Clone, PartialEq)]
pub enum Presence {
    Required,
    Optional,
    /// Optional; the value is filled in when the field is not supplied.
    /// Stored in canonical form once the table has been built.
    Default(Value),
}

/// A predicate evaluated against an already-coerced value.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Character-count bounds, inclusive.
    Length {
        min: Option<usize>,
        max: Option<usize>,
    },
    /// Numeric bounds, inclusive.
    Range { min: Option<f64>, max: Option<f64> },
    /// The text must match the pattern.
    Pattern(Regex),
    /// The text must be one of the listed values (exact match).
    OneOf(Vec<String>),
    /// The URL must be `https` and served from one of these hosts.
    AllowedHosts(Vec<String>),
    /// The timestamp must lie strictly after the evaluation instant.
    InFuture,
}

impl Constraint {
    /// Build an [`Constraint::AllowedHosts`] with hosts trimmed and lowercased.
    pub fn allowed_hosts<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Constraint::AllowedHosts(
            hosts
                .into_iter()
                .map(|h| h.as_ref().trim().to_ascii_lowercase())
                .collect(),
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Constraint::Length { .. } => "length",
            Constraint::Range { .. } => "range",
            Constraint::Pattern(_) => "pattern",
            Constraint::OneOf(_) => "one_of",
            Constraint::AllowedHosts(_) => "allowed_hosts",
            Constraint::InFuture => "in_future",
        }
    }

    fn applies_to(&self, kind: FieldKind) -> bool {
        match self {
            Constraint::Length { .. } | Constraint::Pattern(_) | Constraint::OneOf(_) => {
                kind == FieldKind::Text
            }
            Constraint::Range { .. } => matches!(kind, FieldKind::Number | FieldKind::Integer),
            Constraint::AllowedHosts(_) => kind == FieldKind::Url,
            Constraint::InFuture => kind == FieldKind::Timestamp,
        }
    }

    fn check_consistency(&self) -> Result<(), String> {
        match self {
            Constraint::Length {
                min: Some(min),
                max: Some(max),
            } if min > max => Err(format!("length bounds are inverted ({min} > {max})")),
            Constraint::Range { min, max } => {
                if min.is_some_and(f64::is_nan) || max.is_some_and(f64::is_nan) {
                    return Err("range bound is NaN".to_string());
                }
                match (min, max) {
                    (Some(min), Some(max)) if min > max => {
                        Err(format!("range bounds are inverted ({min} > {max})"))
                    }
                    _ => Ok(()),
                }
            }
            Constraint::OneOf(values) if values.is_empty() => {
                Err("enumeration has no allowed values".to_string())
            }
            Constraint::AllowedHosts(hosts) => {
                if hosts.is_empty() {
                    return Err("allowed host list is empty".to_string());
                }
                match hosts
                    .iter()
                    .find(|h| h.is_empty() || h.contains(|c: char| c == '/' || c.is_whitespace()))
                {
                    Some(bad) => Err(format!("'{bad}' is not a bare host name")),
                    None => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }
}

/// One recognized field: its name, presence policy, canonical kind and the
/// constraints that must hold after coercion.
#[derive(Debug, Clone)]
pub struct FieldRule {
    name: String,
    kind: FieldKind,
    presence: Presence,
    constraints: Vec<Constraint>,
    error_code: String,
}

impl FieldRule {
    fn new(name: impl Into<String>, kind: FieldKind, presence: Presence) -> Self {
        let name = name.into();
        let error_code = error_code(&name);
        Self {
            name,
            kind,
            presence,
            constraints: Vec::new(),
            error_code,
        }
    }

    pub fn required(name: impl Into<String>, kind: FieldKind) -> Self {
        Self::new(name, kind, Presence::Required)
    }

    pub fn optional(name: impl Into<String>, kind: FieldKind) -> Self {
        Self::new(name, kind, Presence::Optional)
    }

    /// Make the field optional, falling back to `value` when not supplied.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.presence = Presence::Default(value.into());
        self
    }

    /// Append a constraint. Constraints run in the order they were added.
    pub fn constrain(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// The `<FIELD>_INVALID` code reported for any failure of this field.
    pub fn error_code(&self) -> &str {
        &self.error_code
    }
}

/// Ordered, immutable set of field rules.
///
/// Declaration order is evaluation order, so it decides which failure is
/// reported when a candidate violates several rules.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<FieldRule>,
}

impl RuleTable {
    /// Build a table, rejecting internally inconsistent rule sets:
    ///
    /// - empty or duplicate field names (or two names sharing an error code)
    /// - a constraint that cannot apply to the field's kind
    /// - inverted or NaN bounds, empty enumerations, malformed host lists
    /// - a default that does not coerce to the field's kind or breaks one of
    ///   its constraints, and a default combined with [`Constraint::InFuture`]
    pub fn new(mut rules: Vec<FieldRule>) -> Result<Self, CoreError> {
        let mut names = HashSet::new();
        let mut codes = HashSet::new();

        for rule in &mut rules {
            if rule.name.trim().is_empty() {
                return Err(invalid("field name must not be empty"));
            }
            if rule.error_code.strip_suffix("_INVALID").is_some_and(str::is_empty) {
                return Err(invalid(format!(
                    "field name '{}' has no letters or digits to derive an error code from",
                    rule.name
                )));
            }
            if !names.insert(rule.name.clone()) {
                return Err(invalid(format!("duplicate field '{}'", rule.name)));
            }
            if !codes.insert(rule.error_code.clone()) {
                return Err(invalid(format!(
                    "field '{}' collides with another field on error code {}",
                    rule.name, rule.error_code
                )));
            }

            for constraint in &rule.constraints {
                if !constraint.applies_to(rule.kind) {
                    return Err(invalid(format!(
                        "constraint {} cannot apply to {} field '{}'",
                        constraint.name(),
                        rule.kind.as_str(),
                        rule.name
                    )));
                }
                constraint
                    .check_consistency()
                    .map_err(|e| invalid(format!("field '{}': {e}", rule.name)))?;
            }

            if let Presence::Default(raw) = &rule.presence {
                let canonical = canonical_default(rule, raw)?;
                rule.presence = Presence::Default(canonical);
            }
        }

        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub fn get(&self, name: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn canonical_default(rule: &FieldRule, raw: &Value) -> Result<Value, CoreError> {
    if rule
        .constraints
        .iter()
        .any(|c| matches!(c, Constraint::InFuture))
    {
        return Err(invalid(format!(
            "field '{}' cannot combine a default with in_future",
            rule.name
        )));
    }

    let value = coerce(rule.kind, raw).map_err(|e| {
        invalid(format!("default for field '{}' {e}", rule.name))
    })?;

    // InFuture is excluded above, so the instant is irrelevant here.
    for constraint in &rule.constraints {
        check_constraint(constraint, &value, DateTime::<Utc>::MIN_UTC).map_err(|e| {
            invalid(format!("default for field '{}' {e}", rule.name))
        })?;
    }

    Ok(value.into_json())
}

fn invalid(msg: impl Into<String>) -> CoreError {
    CoreError::InvalidRuleTable(msg.into())
}

/// Derive the `<FIELD_NAME_IN_SCREAMING_SNAKE>_INVALID` code for a field.
///
/// Word boundaries are lower→upper transitions and the last capital of an
/// acronym followed by a lowercase letter, so `imgURL` → `IMG_URL_INVALID`
/// and `dateTime` → `DATE_TIME_INVALID`.
pub fn error_code(field: &str) -> String {
    let chars: Vec<char> = field.chars().collect();
    let mut out = String::with_capacity(field.len() + 16);

    for (i, &c) in chars.iter().enumerate() {
        if matches!(c, '-' | ' ' | '.' | '_') {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
        }
        out.extend(c.to_uppercase());
    }

    while out.ends_with('_') {
        out.pop();
    }
    out.push_str("_INVALID");
    out
}
