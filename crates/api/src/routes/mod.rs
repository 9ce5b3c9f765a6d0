pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /events/validate        coerce and validate a candidate (POST)
/// /events/rules           event field rules in evaluation order (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/events/validate", post(handlers::events::validate_event))
        .route("/events/rules", get(handlers::events::list_event_rules))
}
