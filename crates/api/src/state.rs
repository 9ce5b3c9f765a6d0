use std::sync::Arc;

use marquee_core::validation::RuleTable;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cloning is cheap; the rule table sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Event-creation rule table, built once at startup from `ServerConfig`.
    pub event_rules: Arc<RuleTable>,
}
