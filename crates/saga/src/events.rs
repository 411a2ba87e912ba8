//! Outbound facts announced by the saga.

use chrono::{DateTime, Utc};
use common::{OrderId, TenantId};
use domain::{BuyerId, Money};
use serde::{Deserialize, Serialize};

/// Fact published when a checkout reaches Confirmed.
///
/// Delivered at-least-once to any number of subscribers; consumers must
/// tolerate duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderConfirmed {
    pub order_id: OrderId,
    pub buyer_id: BuyerId,
    pub tenant_id: TenantId,
    pub total_amount: Money,
    pub confirmed_at: DateTime<Utc>,
}

impl OrderConfirmed {
    /// Routing key under which the fact is broadcast.
    pub const NAME: &'static str = "market.order.confirmed";
}
