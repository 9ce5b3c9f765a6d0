//! Shared response envelope types for API handlers.
//!
//! Listing endpoints use a `{ "data": ... }` envelope. Validation endpoints
//! answer with [`ValidationReport`](marquee_core::validation::ValidationReport)
//! directly, since callers branch on its `ok` flag.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
