//! Saga-based checkout endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use domain::{BuyerId, Order};
use saga::{CheckoutItem, CheckoutSaga, EventPublisher, PaymentGateway};
use serde::{Deserialize, Serialize};
use store::{InMemoryInventoryLedger, InMemoryOrderStore};
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::{tenant_from, user_from};

/// Shared application state accessible from all handlers.
pub struct AppState<G: PaymentGateway, P: EventPublisher> {
    pub saga: CheckoutSaga<InMemoryOrderStore, InMemoryInventoryLedger, G, P>,
    pub inventory: InMemoryInventoryLedger,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItemRequest>,
}

#[derive(Deserialize)]
pub struct CheckoutItemRequest {
    pub product_id: Uuid,
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub buyer_id: String,
    pub status: String,
    pub total_cents: i64,
    pub items: Vec<OrderItemResponse>,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let items = order
            .items
            .iter()
            .map(|item| OrderItemResponse {
                product_id: item.product_id.to_string(),
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                unit_price_cents: item.unit_price.cents(),
            })
            .collect();

        Self {
            id: order.id.to_string(),
            buyer_id: order.buyer_id.to_string(),
            status: order.status.to_string(),
            total_cents: order.total_amount.cents(),
            items,
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /market/orders/checkout — runs the checkout saga for the buyer's cart.
#[tracing::instrument(skip(state, headers, req))]
pub async fn checkout<G: PaymentGateway + 'static, P: EventPublisher + 'static>(
    State(state): State<Arc<AppState<G, P>>>,
    headers: HeaderMap,
    Json(req): Json<CheckoutRequest>,
) -> Result<(axum::http::StatusCode, Json<OrderResponse>), ApiError> {
    let tenant_id = tenant_from(&headers)?;
    let buyer_id = BuyerId::from_uuid(user_from(&headers)?);

    let items: Vec<CheckoutItem> = req
        .items
        .into_iter()
        .map(|item| CheckoutItem {
            product_id: item.product_id.into(),
            quantity: item.quantity,
        })
        .collect();

    let order = state.saga.checkout(tenant_id, buyer_id, items).await?;

    Ok((axum::http::StatusCode::CREATED, Json(order.into())))
}
