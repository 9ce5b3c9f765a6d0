//! Coercion of loosely-typed JSON values to canonical field kinds.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde_json::Value;
use url::Url;

use super::rules::FieldKind;
use crate::types::Timestamp;

/// Offset-less layouts accepted in addition to RFC 3339, read as UTC.
/// These are what HTML `datetime-local` inputs submit.
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// A field value after coercion, before it is written back out as JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalValue {
    Text(String),
    Number(f64),
    Integer(i64),
    Boolean(bool),
    Timestamp(Timestamp),
    Url(Url),
}

impl CanonicalValue {
    pub fn into_json(self) -> Value {
        match self {
            CanonicalValue::Text(s) => Value::String(s),
            CanonicalValue::Number(n) => number_to_json(n),
            CanonicalValue::Integer(i) => Value::from(i),
            CanonicalValue::Boolean(b) => Value::Bool(b),
            CanonicalValue::Timestamp(ts) => {
                Value::String(ts.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            CanonicalValue::Url(url) => Value::String(url.into()),
        }
    }
}

/// `true` when the value counts as "not supplied": absent, `null`, or a
/// string that is empty after trimming.
pub fn is_missing(raw: Option<&Value>) -> bool {
    match raw {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        _ => false,
    }
}

/// Coerce `raw` toward `kind`.
///
/// On failure returns a short description suitable for appending to the
/// field name, e.g. `"must be a number"`.
pub fn coerce(kind: FieldKind, raw: &Value) -> Result<CanonicalValue, String> {
    match kind {
        FieldKind::Text => coerce_text(raw).map(CanonicalValue::Text),
        FieldKind::Number => coerce_number(raw).map(CanonicalValue::Number),
        FieldKind::Integer => coerce_integer(raw).map(CanonicalValue::Integer),
        FieldKind::Boolean => coerce_boolean(raw).map(CanonicalValue::Boolean),
        FieldKind::Timestamp => coerce_timestamp(raw).map(CanonicalValue::Timestamp),
        FieldKind::Url => coerce_url(raw).map(CanonicalValue::Url),
    }
}

fn coerce_text(raw: &Value) -> Result<String, String> {
    match raw {
        Value::String(s) => Ok(s.trim().to_string()),
        other => Err(format!("must be a string, got {}", json_type_name(other))),
    }
}

fn coerce_number(raw: &Value) -> Result<f64, String> {
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(format!("must be a number, got {}", describe(raw))),
    }
}

fn coerce_integer(raw: &Value) -> Result<i64, String> {
    // Exact parse first; the f64 path below only handles forms like "50.0".
    let exact = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    if let Some(i) = exact {
        return Ok(i);
    }

    let n = coerce_number(raw).map_err(|_| format!("must be an integer, got {}", describe(raw)))?;
    if n.fract() != 0.0 || n < i64::MIN as f64 || n >= i64::MAX as f64 {
        return Err(format!("must be an integer, got {}", describe(raw)));
    }
    Ok(n as i64)
}

fn coerce_boolean(raw: &Value) -> Result<bool, String> {
    let parsed = match raw {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_f64() {
            Some(v) if v == 1.0 => Some(true),
            Some(v) if v == 0.0 => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed.ok_or_else(|| format!("must be a boolean, got {}", describe(raw)))
}

fn coerce_timestamp(raw: &Value) -> Result<Timestamp, String> {
    let Value::String(s) = raw else {
        return Err(format!(
            "must be an ISO 8601 timestamp, got {}",
            json_type_name(raw)
        ));
    };
    parse_timestamp(s.trim()).ok_or_else(|| format!("must be an ISO 8601 timestamp, got {raw}"))
}

/// Parsed timestamps are truncated to the millisecond precision they are
/// written back out with, so constraints see exactly the emitted value.
fn parse_timestamp(s: &str) -> Option<Timestamp> {
    let parsed = match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(_) => NAIVE_TIMESTAMP_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .map(|naive| naive.and_utc()),
    };
    parsed.map(|ts| ts.trunc_subsecs(3))
}

fn coerce_url(raw: &Value) -> Result<Url, String> {
    let Value::String(s) = raw else {
        return Err(format!("must be a URL, got {}", json_type_name(raw)));
    };
    Url::parse(s.trim()).map_err(|e| format!("must be an absolute URL ({e})"))
}

/// Integral values are written as JSON integers so `"10"` and `10` normalize
/// to the same record.
fn number_to_json(n: f64) -> Value {
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

fn describe(raw: &Value) -> String {
    match raw {
        Value::String(_) | Value::Number(_) => raw.to_string(),
        other => json_type_name(other).to_string(),
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
