//! Order store trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, TenantId};
use domain::{Order, OrderStatus};
use tokio::sync::RwLock;

use crate::error::StoreError;

/// Trait for order persistence.
///
/// `transition` is a guarded compare-and-set: it only applies when the
/// order is currently in the expected `from` status. The orchestrator is
/// single-writer per order, so a conflict here indicates a bug upstream;
/// the store enforces it regardless.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order.
    async fn insert(&self, order: Order) -> Result<Order, StoreError>;

    /// Loads an order by ID within a tenant.
    ///
    /// Returns None when the order does not exist or belongs to another
    /// tenant.
    async fn get(&self, order_id: OrderId, tenant_id: &TenantId)
    -> Result<Option<Order>, StoreError>;

    /// Atomically moves an order from `from` to `to`.
    ///
    /// Fails with [`StoreError::Conflict`] when the order is not currently
    /// in `from`, and with [`StoreError::IllegalTransition`] when the pair
    /// is outside the status transition table. On failure the order is
    /// left unchanged.
    async fn transition(
        &self,
        order_id: OrderId,
        tenant_id: &TenantId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Order, StoreError>;
}

/// In-memory order store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Returns a snapshot of every stored order.
    pub async fn all(&self) -> Vec<Order> {
        self.orders.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> Result<Order, StoreError> {
        let mut orders = self.orders.write().await;
        orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(
        &self,
        order_id: OrderId,
        tenant_id: &TenantId,
    ) -> Result<Option<Order>, StoreError> {
        let orders = self.orders.read().await;
        Ok(orders
            .get(&order_id)
            .filter(|o| &o.tenant_id == tenant_id)
            .cloned())
    }

    async fn transition(
        &self,
        order_id: OrderId,
        tenant_id: &TenantId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Order, StoreError> {
        if !from.can_transition_to(to) {
            return Err(StoreError::IllegalTransition { from, to });
        }

        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&order_id)
            .filter(|o| &o.tenant_id == tenant_id)
            .ok_or(StoreError::OrderNotFound { order_id })?;

        if order.status != from {
            return Err(StoreError::Conflict {
                order_id,
                expected: from,
                actual: order.status,
            });
        }

        order.status = to;
        tracing::debug!(%order_id, %from, %to, "order status transition");
        Ok(order.clone())
    }
}
