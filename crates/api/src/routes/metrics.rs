//! Prometheus metrics endpoint.
//!
//! Exposes the checkout saga counters (`checkout_*_total`,
//! `payment_compensation_failures_total`) and the request-level metrics
//! recorded by the HTTP layers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

/// GET /metrics — renders the recorder's snapshot in Prometheus text format.
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        handle.render(),
    )
}
