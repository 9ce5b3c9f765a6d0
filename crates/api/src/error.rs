use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use marquee_core::error::CoreError;
use marquee_core::validation::{FieldError, ValidationReport};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`FieldError`] for rejected
/// candidates. Implements [`IntoResponse`] to produce consistent
/// `{ "ok": false, "code": ..., "message": ... }` bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `marquee_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A candidate record failed validation.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            // --- Field validation: body carries the offending field too ---
            AppError::Field(err) => {
                // INVALID_INPUT means the body was not a record at all.
                let status = if err.is_structural() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::UNPROCESSABLE_ENTITY
                };
                let body = ValidationReport::Invalid(err);
                return (status, axum::Json(body)).into_response();
            }

            // --- CoreError variants ---
            AppError::Core(CoreError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg)
            }
            AppError::Core(CoreError::InvalidRuleTable(msg)) => {
                tracing::error!(error = %msg, "Rule table error during request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
        };

        let body = json!({
            "ok": false,
            "code": code,
            "message": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
