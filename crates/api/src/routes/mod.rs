//! HTTP route handlers.

pub mod checkout;
pub mod health;
pub mod metrics;
pub mod products;

use axum::http::HeaderMap;
use common::TenantId;
use uuid::Uuid;

use crate::error::ApiError;

/// Extracts the tenant injected by the upstream gateway.
pub(crate) fn tenant_from(headers: &HeaderMap) -> Result<TenantId, ApiError> {
    headers
        .get("X-Tenant-Id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(TenantId::new)
        .ok_or_else(|| ApiError::BadRequest("Missing X-Tenant-Id header".to_string()))
}

/// Extracts the authenticated user injected by the upstream gateway.
pub(crate) fn user_from(headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let raw = headers
        .get("X-User-Id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Missing X-User-Id header".to_string()))?;

    Uuid::parse_str(raw).map_err(|e| ApiError::Unauthorized(format!("Invalid X-User-Id: {e}")))
}
