//! Store error types.

use common::OrderId;
use domain::{OrderStatus, ProductId};
use thiserror::Error;

/// Errors that can occur in the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Order not found within the tenant.
    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: OrderId },

    /// The order was not in the expected status for a guarded transition.
    #[error("Order {order_id} is in {actual} status, expected {expected}")]
    Conflict {
        order_id: OrderId,
        expected: OrderStatus,
        actual: OrderStatus,
    },

    /// The requested status pair is outside the transition table.
    #[error("Illegal status transition: {from} -> {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },
}

/// Errors that can occur in the inventory ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Product not found within the tenant.
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: ProductId },

    /// Pre-decrement stock did not cover the requested quantity.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },
}
