//! Checkout error taxonomy.

use domain::ProductId;
use store::StoreError;
use thiserror::Error;

/// Errors returned by the checkout saga.
///
/// The first three variants are client-input faults raised before any
/// external effect. `PaymentUnavailable` and `PaymentDeclined` leave the
/// order Canceled with nothing to compensate. `InsufficientStock` leaves
/// the order Canceled after the payment authorization has been
/// compensated. Every variant is returned only once the order has
/// reached its terminal status.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The request itself is malformed (empty cart, non-positive quantity).
    #[error("Invalid checkout request: {0}")]
    Validation(String),

    /// A referenced product does not exist.
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: ProductId },

    /// A referenced product belongs to another tenant.
    #[error("Cross-tenant product access is not allowed: {product_id}")]
    TenantMismatch { product_id: ProductId },

    /// The payment actor could not be reached or timed out.
    #[error("Payment authorization failed: {0}")]
    PaymentUnavailable(String),

    /// The payment actor answered with a non-authorized status.
    #[error("Payment not authorized")]
    PaymentDeclined,

    /// A line item could not be covered by available stock.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// Order store fault.
    #[error("Order store error: {0}")]
    Store(#[from] StoreError),
}
