//! Data validation engine.
//!
//! Declarative field rules, coercion to canonical kinds, and a pure-logic
//! evaluator that reports the first failing field. No I/O and no logging.

pub mod coerce;
pub mod evaluator;
pub mod outcome;
pub mod rules;

pub use evaluator::coerce_and_validate;
pub use outcome::{FailureReason, FieldError, NormalizedRecord, ValidationReport, ValidationResult};
pub use rules::{Constraint, FieldKind, FieldRule, Presence, RuleTable, INVALID_INPUT};
