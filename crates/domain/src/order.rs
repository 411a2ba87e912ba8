//! The Order record.

use chrono::{DateTime, Utc};
use common::{OrderId, TenantId};
use serde::{Deserialize, Serialize};

use crate::status::OrderStatus;
use crate::value_objects::{BuyerId, Money, OrderItem};

/// A buyer's order with its line items and frozen total.
///
/// `total_amount` is computed once at creation from the items' price
/// snapshots and never recomputed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier, assigned at creation.
    pub id: OrderId,

    /// Tenant that owns this order.
    pub tenant_id: TenantId,

    /// The buyer who placed the order.
    pub buyer_id: BuyerId,

    /// Current status within the checkout saga.
    pub status: OrderStatus,

    /// Sum of item subtotals, frozen at creation.
    pub total_amount: Money,

    /// Line items in submission order.
    pub items: Vec<OrderItem>,

    /// When the order was created.
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new Pending order, computing the total from the
    /// items' price snapshots.
    pub fn pending(tenant_id: TenantId, buyer_id: BuyerId, items: Vec<OrderItem>) -> Self {
        let total_amount = Self::total_of(&items);
        Self {
            id: OrderId::new(),
            tenant_id,
            buyer_id,
            status: OrderStatus::Pending,
            total_amount,
            items,
            created_at: Utc::now(),
        }
    }

    /// Sums the subtotals of a set of items.
    pub fn total_of(items: &[OrderItem]) -> Money {
        let mut total = Money::zero();
        for item in items {
            total += item.subtotal();
        }
        total
    }

    /// Returns true if `total_amount` equals the sum of item subtotals.
    pub fn total_is_consistent(&self) -> bool {
        self.total_amount == Self::total_of(&self.items)
    }
}
