//! Handlers for the `/events` resource.
//!
//! Validation only: accepted candidates are returned normalized and are not
//! stored by this service.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use marquee_core::validation::{coerce_and_validate, FieldKind, Presence, ValidationReport};
use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/events/validate
///
/// Coerce and validate an event-creation candidate. Any JSON body is
/// accepted; a body that is not JSON yields `BAD_REQUEST` (400), a non-object
/// body yields `INVALID_INPUT` (400) and a field failure yields
/// `<FIELD>_INVALID` (422).
pub async fn validate_event(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<ValidationReport>> {
    let Json(candidate) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Unreadable event candidate body");
        AppError::BadRequest(rejection.body_text())
    })?;

    match coerce_and_validate(&state.event_rules, &candidate, Utc::now()) {
        Ok(record) => {
            tracing::debug!(fields = record.len(), "Event candidate accepted");
            Ok(Json(ValidationReport::Valid(record)))
        }
        Err(err) => {
            tracing::info!(
                code = %err.code,
                field = %err.field,
                reason = ?err.reason,
                "Event candidate rejected"
            );
            Err(AppError::Field(err))
        }
    }
}

/// One field of the event rule table, as exposed to clients.
#[derive(Debug, Serialize)]
pub struct FieldRuleSummary {
    pub field: String,
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    pub error_code: String,
    pub constraints: Vec<&'static str>,
}

/// GET /api/v1/events/rules
///
/// List the event fields in evaluation order with the error code each one
/// reports, so clients can map codes back to form inputs.
pub async fn list_event_rules(
    State(state): State<AppState>,
) -> Json<DataResponse<Vec<FieldRuleSummary>>> {
    let data = state
        .event_rules
        .rules()
        .iter()
        .map(|rule| FieldRuleSummary {
            field: rule.name().to_string(),
            kind: rule.kind(),
            required: matches!(rule.presence(), Presence::Required),
            default: match rule.presence() {
                Presence::Default(value) => Some(value.clone()),
                _ => None,
            },
            error_code: rule.error_code().to_string(),
            constraints: rule.constraints().iter().map(|c| c.name()).collect(),
        })
        .collect();

    Json(DataResponse { data })
}
