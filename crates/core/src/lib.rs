//! Event-creation validation and coercion engine.
//!
//! Everything in this crate is pure: no I/O, no logging, no global mutable
//! state. The only shared value is the immutable event [`RuleTable`], built
//! once on first use.
//!
//! [`RuleTable`]: validation::rules::RuleTable

pub mod error;
pub mod event;
pub mod types;
pub mod validation;
