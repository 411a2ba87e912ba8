//! Liveness endpoint.
//!
//! The marketplace holds all state in process, so liveness is the only
//! meaningful signal; there is no backing store to probe.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health — reports the marketplace service as alive.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
