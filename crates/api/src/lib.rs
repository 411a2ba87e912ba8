//! HTTP API server for the marketplace checkout system.
//!
//! Exposes product catalog management and the saga-based checkout,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{CheckoutSaga, EventPublisher, PaymentGateway};
use store::{InMemoryInventoryLedger, InMemoryOrderStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use routes::checkout::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<G: PaymentGateway + 'static, P: EventPublisher + 'static>(
    state: Arc<AppState<G, P>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/market/products", get(routes::products::list::<G, P>))
        .route("/market/products", post(routes::products::create::<G, P>))
        .route(
            "/market/orders/checkout",
            post(routes::checkout::checkout::<G, P>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state with in-memory stores.
pub fn create_default_state<G: PaymentGateway + 'static, P: EventPublisher + 'static>(
    gateway: G,
    publisher: P,
    payment_timeout: Option<Duration>,
) -> Arc<AppState<G, P>> {
    let orders = InMemoryOrderStore::new();
    let inventory = InMemoryInventoryLedger::new();

    let mut saga = CheckoutSaga::new(orders, inventory.clone(), gateway, publisher);
    if let Some(timeout) = payment_timeout {
        saga = saga.with_payment_timeout(timeout);
    }

    Arc::new(AppState { saga, inventory })
}
