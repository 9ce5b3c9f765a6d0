//! Rule evaluator: pure logic, no I/O.
//!
//! Rules run in table order and evaluation stops at the first failing field,
//! so the reported error is deterministic for a given table and candidate.

use serde_json::{Map, Value};

use super::coerce::{coerce, is_missing, json_type_name, CanonicalValue};
use super::outcome::{FieldError, NormalizedRecord, ValidationResult};
use super::rules::{Constraint, FieldRule, Presence, RuleTable};
use crate::types::Timestamp;

/// Coerce and validate `candidate` against every rule in `table`.
///
/// `now` is the instant [`Constraint::InFuture`] compares against. Keys the
/// table does not declare are dropped from the output.
pub fn coerce_and_validate(
    table: &RuleTable,
    candidate: &Value,
    now: Timestamp,
) -> ValidationResult {
    let Some(fields) = candidate.as_object() else {
        return Err(FieldError::invalid_input(json_type_name(candidate)));
    };

    let mut record = Map::new();
    for rule in table.rules() {
        if let Some(value) = evaluate_field(rule, fields.get(rule.name()), now)? {
            record.insert(rule.name().to_string(), value);
        }
    }

    Ok(NormalizedRecord::from(record))
}

/// Evaluate one rule against its raw value.
///
/// Returns `Ok(None)` for an optional field without a default that was not
/// supplied.
pub fn evaluate_field(
    rule: &FieldRule,
    raw: Option<&Value>,
    now: Timestamp,
) -> Result<Option<Value>, FieldError> {
    let raw = match raw {
        Some(value) if !is_missing(Some(value)) => value,
        _ => {
            return match rule.presence() {
                Presence::Required => Err(FieldError::missing(rule)),
                Presence::Optional => Ok(None),
                Presence::Default(value) => Ok(Some(value.clone())),
            }
        }
    };

    let value = coerce(rule.kind(), raw).map_err(|e| FieldError::malformed(rule, &e))?;

    for constraint in rule.constraints() {
        check_constraint(constraint, &value, now).map_err(|e| FieldError::rejected(rule, &e))?;
    }

    Ok(Some(value.into_json()))
}

/// Check a single constraint against a coerced value.
///
/// Kind compatibility is enforced when the [`RuleTable`] is built, so a
/// constraint paired with a value of another kind passes.
pub(crate) fn check_constraint(
    constraint: &Constraint,
    value: &CanonicalValue,
    now: Timestamp,
) -> Result<(), String> {
    match (constraint, value) {
        (Constraint::Length { min, max }, CanonicalValue::Text(s)) => {
            check_length(s.chars().count(), *min, *max)
        }
        (Constraint::Range { min, max }, CanonicalValue::Number(n)) => check_range(*n, *min, *max),
        (Constraint::Range { min, max }, CanonicalValue::Integer(i)) => {
            check_range(*i as f64, *min, *max)
        }
        (Constraint::Pattern(re), CanonicalValue::Text(s)) => {
            if re.is_match(s) {
                Ok(())
            } else {
                Err(format!("must match the pattern {}", re.as_str()))
            }
        }
        (Constraint::OneOf(allowed), CanonicalValue::Text(s)) => {
            if allowed.iter().any(|a| a == s) {
                Ok(())
            } else {
                Err(format!("must be one of: {}", allowed.join(", ")))
            }
        }
        (Constraint::AllowedHosts(hosts), CanonicalValue::Url(url)) => {
            let approved = url.scheme() == "https"
                && url.port().is_none()
                && url
                    .host_str()
                    .is_some_and(|host| hosts.iter().any(|h| h == host));
            if approved {
                Ok(())
            } else {
                Err(format!(
                    "must be an https URL on the default port served from {}",
                    hosts.join(" or ")
                ))
            }
        }
        (Constraint::InFuture, CanonicalValue::Timestamp(ts)) => {
            if *ts > now {
                Ok(())
            } else {
                Err("must be in the future".to_string())
            }
        }
        _ => Ok(()),
    }
}

fn check_length(len: usize, min: Option<usize>, max: Option<usize>) -> Result<(), String> {
    match (min, max) {
        (Some(min), Some(max)) if len < min || len > max => Err(format!(
            "must be between {min} and {max} characters long, got {len}"
        )),
        (Some(min), None) if len < min => Err(format!(
            "must be at least {min} characters long, got {len}"
        )),
        (None, Some(max)) if len > max => Err(format!(
            "must be at most {max} characters long, got {len}"
        )),
        _ => Ok(()),
    }
}

fn check_range(n: f64, min: Option<f64>, max: Option<f64>) -> Result<(), String> {
    match (min, max) {
        (Some(min), Some(max)) if n < min || n > max => {
            Err(format!("must be between {min} and {max}, got {n}"))
        }
        (Some(min), None) if n < min => Err(format!("must be at least {min}, got {n}")),
        (None, Some(max)) if n > max => Err(format!("must be at most {max}, got {n}")),
        _ => Ok(()),
    }
}
