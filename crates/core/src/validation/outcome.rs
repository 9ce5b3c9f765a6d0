//! Validation outcome types and their `{ ok, ... }` wire form.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::rules::{FieldRule, INVALID_INPUT};

/// Either the normalized record or the first field that failed.
pub type ValidationResult = Result<NormalizedRecord, FieldError>;

/// The recognized fields of a candidate, each in canonical form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NormalizedRecord(Map<String, Value>);

impl NormalizedRecord {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for NormalizedRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<NormalizedRecord> for Value {
    fn from(record: NormalizedRecord) -> Self {
        record.into_value()
    }
}

/// Why a field failed. The error code is the same for all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureReason {
    /// Required field absent, `null` or blank.
    Missing,
    /// Present but could not be coerced to the field's kind.
    Malformed,
    /// Coerced, but a constraint did not hold.
    Rejected,
}

/// A single field-attributable validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct FieldError {
    pub code: String,
    pub field: String,
    pub reason: FailureReason,
    pub message: String,
}

impl FieldError {
    pub(crate) fn missing(rule: &FieldRule) -> Self {
        Self::for_rule(rule, FailureReason::Missing, "is required")
    }

    pub(crate) fn malformed(rule: &FieldRule, detail: &str) -> Self {
        Self::for_rule(rule, FailureReason::Malformed, detail)
    }

    pub(crate) fn rejected(rule: &FieldRule, detail: &str) -> Self {
        Self::for_rule(rule, FailureReason::Rejected, detail)
    }

    /// The candidate was not a record at all.
    pub(crate) fn invalid_input(found: &str) -> Self {
        Self {
            code: INVALID_INPUT.to_string(),
            field: String::new(),
            reason: FailureReason::Malformed,
            message: format!("expected an object, got {found}"),
        }
    }

    fn for_rule(rule: &FieldRule, reason: FailureReason, detail: &str) -> Self {
        Self {
            code: rule.error_code().to_string(),
            field: rule.name().to_string(),
            reason,
            message: format!("{} {detail}", rule.name()),
        }
    }

    /// `true` for `INVALID_INPUT`, where no field rule was evaluated.
    pub fn is_structural(&self) -> bool {
        self.code == INVALID_INPUT
    }
}

/// Wire form of a [`ValidationResult`]:
/// `{ "ok": true, "value": {...} }` or
/// `{ "ok": false, "code": "...", "field": "...", "message": "..." }`.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationReport {
    Valid(NormalizedRecord),
    Invalid(FieldError),
}

impl From<ValidationResult> for ValidationReport {
    fn from(result: ValidationResult) -> Self {
        match result {
            Ok(record) => ValidationReport::Valid(record),
            Err(err) => ValidationReport::Invalid(err),
        }
    }
}

impl Serialize for ValidationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ValidationReport::Valid(record) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("ok", &true)?;
                map.serialize_entry("value", record)?;
                map.end()
            }
            ValidationReport::Invalid(err) => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("ok", &false)?;
                map.serialize_entry("code", &err.code)?;
                map.serialize_entry("field", &err.field)?;
                map.serialize_entry("message", &err.message)?;
                map.end()
            }
        }
    }
}
