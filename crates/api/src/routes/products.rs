//! Product catalog endpoints.
//!
//! Role enforcement proper happens at the upstream gateway; these
//! handlers only re-check the identity headers it injects.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use domain::{Money, Product};
use saga::{EventPublisher, PaymentGateway};
use serde::{Deserialize, Serialize};
use store::InventoryLedger;

use crate::error::ApiError;
use crate::routes::checkout::AppState;
use crate::routes::{tenant_from, user_from};

#[derive(Deserialize)]
pub struct ProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: u32,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: u32,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name,
            description: product.description,
            price_cents: product.price.cents(),
            stock: product.stock,
        }
    }
}

/// GET /market/products — lists the tenant's catalog.
#[tracing::instrument(skip(state, headers))]
pub async fn list<G: PaymentGateway + 'static, P: EventPublisher + 'static>(
    State(state): State<Arc<AppState<G, P>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let tenant_id = tenant_from(&headers)?;

    let products = state
        .inventory
        .list_products(&tenant_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// POST /market/products — creates a product listing (TEACHER/ADMIN only).
#[tracing::instrument(skip(state, headers, req))]
pub async fn create<G: PaymentGateway + 'static, P: EventPublisher + 'static>(
    State(state): State<Arc<AppState<G, P>>>,
    headers: HeaderMap,
    Json(req): Json<ProductRequest>,
) -> Result<(axum::http::StatusCode, Json<ProductResponse>), ApiError> {
    let tenant_id = tenant_from(&headers)?;
    let seller_id = user_from(&headers)?;

    let role = headers
        .get("X-User-Role")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Missing X-User-Role header".to_string()))?;
    if role != "TEACHER" && role != "ADMIN" {
        return Err(ApiError::Forbidden(
            "Only TEACHER or ADMIN may create products".to_string(),
        ));
    }

    if req.price_cents < 0 {
        return Err(ApiError::BadRequest("Price must not be negative".to_string()));
    }

    let product = state
        .inventory
        .insert_product(Product::new(
            tenant_id,
            seller_id,
            req.name,
            req.description,
            Money::from_cents(req.price_cents),
            req.stock,
        ))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((axum::http::StatusCode::CREATED, Json(product.into())))
}
