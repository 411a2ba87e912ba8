//! Checkout saga orchestrator.

use std::time::Duration;

use chrono::Utc;
use common::TenantId;
use domain::{BuyerId, Order, OrderItem, OrderStatus, ProductId};
use serde::{Deserialize, Serialize};
use store::{InventoryLedger, LedgerError, OrderStore};

use crate::error::CheckoutError;
use crate::events::OrderConfirmed;
use crate::services::payment::{PaymentGateway, PaymentStatus};
use crate::services::publisher::EventPublisher;

/// Default bound on the payment authorize call. The original design
/// left the call unbounded; a hung payment actor would stall the
/// checkout forever, so a timeout here is treated as authorization
/// failure.
pub const DEFAULT_PAYMENT_TIMEOUT: Duration = Duration::from_secs(5);

/// One requested line of a checkout cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Orchestrates the checkout saga.
///
/// Drives one order per request through Create → Authorize → Commit →
/// Announce, with a bounded compensation sequence on partial failure.
/// The order is durably Pending before any external call and reaches a
/// terminal status before `checkout` returns.
pub struct CheckoutSaga<O, L, G, P>
where
    O: OrderStore,
    L: InventoryLedger,
    G: PaymentGateway,
    P: EventPublisher,
{
    orders: O,
    inventory: L,
    gateway: G,
    publisher: P,
    payment_timeout: Duration,
}

impl<O, L, G, P> CheckoutSaga<O, L, G, P>
where
    O: OrderStore,
    L: InventoryLedger,
    G: PaymentGateway,
    P: EventPublisher,
{
    /// Creates a new saga over the given stores and collaborators.
    pub fn new(orders: O, inventory: L, gateway: G, publisher: P) -> Self {
        Self {
            orders,
            inventory,
            gateway,
            publisher,
            payment_timeout: DEFAULT_PAYMENT_TIMEOUT,
        }
    }

    /// Overrides the bound on the payment authorize call.
    pub fn with_payment_timeout(mut self, timeout: Duration) -> Self {
        self.payment_timeout = timeout;
        self
    }

    /// Runs one checkout to a terminal order status.
    #[tracing::instrument(skip(self, items), fields(%tenant_id, %buyer_id))]
    pub async fn checkout(
        &self,
        tenant_id: TenantId,
        buyer_id: BuyerId,
        items: Vec<CheckoutItem>,
    ) -> Result<Order, CheckoutError> {
        metrics::counter!("checkout_started_total").increment(1);
        let started = std::time::Instant::now();

        // Step 1: Create — no external effect has happened if this fails.
        let order = self
            .create_pending_order(&tenant_id, buyer_id, items)
            .await?;
        tracing::info!(order_id = %order.id, total = %order.total_amount, "pending order created");

        // Step 2: Authorize. Nothing was authorized on failure, so the
        // order is canceled without a compensating cancel call.
        let authorized = tokio::time::timeout(
            self.payment_timeout,
            self.gateway
                .authorize(&tenant_id, order.id, buyer_id, order.total_amount),
        )
        .await;

        let authorization = match authorized {
            Err(_elapsed) => {
                self.cancel_order(&order).await?;
                self.finish_canceled(&order, started);
                return Err(CheckoutError::PaymentUnavailable(format!(
                    "authorization timed out after {:?}",
                    self.payment_timeout
                )));
            }
            Ok(Err(transport)) => {
                self.cancel_order(&order).await?;
                self.finish_canceled(&order, started);
                return Err(CheckoutError::PaymentUnavailable(transport.to_string()));
            }
            Ok(Ok(authorization)) => authorization,
        };

        if authorization.status != PaymentStatus::Authorized {
            self.cancel_order(&order).await?;
            self.finish_canceled(&order, started);
            return Err(CheckoutError::PaymentDeclined);
        }
        tracing::info!(
            order_id = %order.id,
            payment_id = %authorization.payment_id,
            "payment authorized"
        );

        // Step 3: Commit inventory; compensate the authorization when
        // any line item cannot be covered.
        if let Err(shortfall) = self.commit_inventory(&order).await {
            self.cancel_order(&order).await?;
            self.compensate_payment(&order).await;
            self.finish_canceled(&order, started);
            return Err(shortfall);
        }

        let confirmed = self
            .orders
            .transition(
                order.id,
                &tenant_id,
                OrderStatus::Pending,
                OrderStatus::Confirmed,
            )
            .await?;

        // Step 4: Announce. Best-effort; a failure here never rolls
        // back a confirmed order.
        let event = OrderConfirmed {
            order_id: confirmed.id,
            buyer_id: confirmed.buyer_id,
            tenant_id: confirmed.tenant_id.clone(),
            total_amount: confirmed.total_amount,
            confirmed_at: Utc::now(),
        };
        if let Err(publish_err) = self.publisher.publish(OrderConfirmed::NAME, &event).await {
            metrics::counter!("order_confirmed_publish_failures_total").increment(1);
            tracing::warn!(
                order_id = %confirmed.id,
                error = %publish_err,
                "failed to publish order confirmed event"
            );
        }

        metrics::counter!("checkout_confirmed_total").increment(1);
        metrics::histogram!("checkout_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::info!(order_id = %confirmed.id, "checkout confirmed");

        Ok(confirmed)
    }

    /// Validates the cart, snapshots prices, and persists a Pending order.
    async fn create_pending_order(
        &self,
        tenant_id: &TenantId,
        buyer_id: BuyerId,
        items: Vec<CheckoutItem>,
    ) -> Result<Order, CheckoutError> {
        if items.is_empty() {
            return Err(CheckoutError::Validation(
                "at least one item is required".to_string(),
            ));
        }

        // Merge duplicate product lines, preserving submission order so
        // the commit step always locks products in a fixed sequence.
        let mut requested: Vec<(ProductId, u32)> = Vec::new();
        for item in items {
            if item.quantity == 0 {
                return Err(CheckoutError::Validation(
                    "quantity must be positive".to_string(),
                ));
            }
            match requested.iter_mut().find(|(id, _)| *id == item.product_id) {
                Some((_, quantity)) => *quantity += item.quantity,
                None => requested.push((item.product_id, item.quantity)),
            }
        }

        let mut order_items = Vec::with_capacity(requested.len());
        for (product_id, quantity) in requested {
            let product = self
                .inventory
                .find_product(product_id)
                .await
                .map_err(ledger_fault)?
                .ok_or(CheckoutError::ProductNotFound { product_id })?;

            if &product.tenant_id != tenant_id {
                return Err(CheckoutError::TenantMismatch { product_id });
            }

            order_items.push(OrderItem::new(
                product_id,
                product.name,
                quantity,
                product.price,
            ));
        }

        let order = Order::pending(tenant_id.clone(), buyer_id, order_items);
        Ok(self.orders.insert(order).await?)
    }

    /// Decrements stock per line item, one product lock at a time.
    ///
    /// On any failure the already-decremented items are restocked in
    /// reverse, so no partial decrement survives the abort.
    async fn commit_inventory(&self, order: &Order) -> Result<(), CheckoutError> {
        let mut decremented: Vec<&OrderItem> = Vec::new();

        for item in &order.items {
            match self
                .inventory
                .try_decrement(item.product_id, &order.tenant_id, item.quantity)
                .await
            {
                Ok(_) => decremented.push(item),
                Err(failure) => {
                    for done in decremented.iter().rev() {
                        if let Err(restock_err) = self
                            .inventory
                            .restock(done.product_id, &order.tenant_id, done.quantity)
                            .await
                        {
                            tracing::error!(
                                order_id = %order.id,
                                product_id = %done.product_id,
                                error = %restock_err,
                                "failed to return stock after aborted commit"
                            );
                        }
                    }
                    return Err(ledger_fault(failure));
                }
            }
        }

        Ok(())
    }

    /// Moves the order to its Canceled terminal status.
    async fn cancel_order(&self, order: &Order) -> Result<(), CheckoutError> {
        self.orders
            .transition(
                order.id,
                &order.tenant_id,
                OrderStatus::Pending,
                OrderStatus::Canceled,
            )
            .await?;
        Ok(())
    }

    /// Issues the compensating payment cancel.
    ///
    /// Its own failure is swallowed: the caller's outcome (order
    /// canceled) is already correct, so this becomes an operational
    /// alert for manual payment reconciliation.
    async fn compensate_payment(&self, order: &Order) {
        match self.gateway.cancel(&order.tenant_id, order.id).await {
            Ok(_) => {
                tracing::info!(order_id = %order.id, "payment authorization canceled");
            }
            Err(cancel_err) => {
                metrics::counter!("payment_compensation_failures_total").increment(1);
                tracing::warn!(
                    order_id = %order.id,
                    error = %cancel_err,
                    "payment cancel failed, manual reconciliation required"
                );
            }
        }
    }

    fn finish_canceled(&self, order: &Order, started: std::time::Instant) {
        metrics::counter!("checkout_canceled_total").increment(1);
        metrics::histogram!("checkout_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::info!(order_id = %order.id, "checkout canceled");
    }
}

fn ledger_fault(err: LedgerError) -> CheckoutError {
    match err {
        LedgerError::InsufficientStock {
            product_id,
            requested,
            available,
        } => CheckoutError::InsufficientStock {
            product_id,
            requested,
            available,
        },
        LedgerError::ProductNotFound { product_id } => {
            CheckoutError::ProductNotFound { product_id }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::payment::InMemoryPaymentGateway;
    use crate::services::publisher::InMemoryPublisher;
    use domain::{Money, Product};
    use store::{InMemoryInventoryLedger, InMemoryOrderStore};
    use uuid::Uuid;

    type TestSaga = CheckoutSaga<
        InMemoryOrderStore,
        InMemoryInventoryLedger,
        InMemoryPaymentGateway,
        InMemoryPublisher,
    >;

    fn setup() -> (
        TestSaga,
        InMemoryOrderStore,
        InMemoryInventoryLedger,
        InMemoryPaymentGateway,
        InMemoryPublisher,
    ) {
        let orders = InMemoryOrderStore::new();
        let inventory = InMemoryInventoryLedger::new();
        let gateway = InMemoryPaymentGateway::new();
        let publisher = InMemoryPublisher::new();

        let saga = CheckoutSaga::new(
            orders.clone(),
            inventory.clone(),
            gateway.clone(),
            publisher.clone(),
        );

        (saga, orders, inventory, gateway, publisher)
    }

    async fn seed_product(
        inventory: &InMemoryInventoryLedger,
        tenant: &str,
        price_cents: i64,
        stock: u32,
    ) -> Product {
        inventory
            .insert_product(Product::new(
                tenant.into(),
                Uuid::new_v4(),
                "Widget",
                None,
                Money::from_cents(price_cents),
                stock,
            ))
            .await
            .unwrap()
    }

    fn cart(product_id: ProductId, quantity: u32) -> Vec<CheckoutItem> {
        vec![CheckoutItem {
            product_id,
            quantity,
        }]
    }

    #[tokio::test]
    async fn happy_path_confirms_and_decrements() {
        let (saga, orders, inventory, gateway, publisher) = setup();
        let tenant: TenantId = "uni-a".into();
        let buyer = BuyerId::new();
        let product = seed_product(&inventory, "uni-a", 500, 10).await;

        let order = saga
            .checkout(tenant.clone(), buyer, cart(product.id, 2))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.total_amount.cents(), 1000);
        assert!(order.total_is_consistent());
        assert_eq!(inventory.stock_of(product.id).await, Some(8));

        let stored = orders.get(order.id, &tenant).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Confirmed);

        assert_eq!(gateway.authorization_count(), 1);
        assert_eq!(gateway.cancel_calls(), 0);

        let published = publisher.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].order_id, order.id);
        assert_eq!(published[0].buyer_id, buyer);
        assert_eq!(published[0].total_amount.cents(), 1000);
        assert_eq!(
            publisher.published_names(),
            vec![OrderConfirmed::NAME.to_string()]
        );
    }

    #[tokio::test]
    async fn empty_cart_is_rejected_before_any_effect() {
        let (saga, orders, _, gateway, _) = setup();

        let err = saga
            .checkout("uni-a".into(), BuyerId::new(), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));
        assert_eq!(orders.order_count().await, 0);
        assert_eq!(gateway.authorize_calls(), 0);
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected() {
        let (saga, orders, inventory, _, _) = setup();
        let product = seed_product(&inventory, "uni-a", 500, 10).await;

        let err = saga
            .checkout("uni-a".into(), BuyerId::new(), cart(product.id, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));
        assert_eq!(orders.order_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_product_is_rejected() {
        let (saga, orders, _, gateway, _) = setup();

        let err = saga
            .checkout("uni-a".into(), BuyerId::new(), cart(ProductId::new(), 1))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::ProductNotFound { .. }));
        assert_eq!(orders.order_count().await, 0);
        assert_eq!(gateway.authorize_calls(), 0);
    }

    #[tokio::test]
    async fn cross_tenant_product_is_rejected() {
        let (saga, orders, inventory, _, _) = setup();
        let foreign = seed_product(&inventory, "uni-b", 500, 10).await;

        let err = saga
            .checkout("uni-a".into(), BuyerId::new(), cart(foreign.id, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::TenantMismatch { .. }));
        assert_eq!(orders.order_count().await, 0);
    }

    #[tokio::test]
    async fn duplicate_lines_are_merged() {
        let (saga, _, inventory, _, _) = setup();
        let product = seed_product(&inventory, "uni-a", 500, 10).await;

        let order = saga
            .checkout(
                "uni-a".into(),
                BuyerId::new(),
                vec![
                    CheckoutItem {
                        product_id: product.id,
                        quantity: 2,
                    },
                    CheckoutItem {
                        product_id: product.id,
                        quantity: 3,
                    },
                ],
            )
            .await
            .unwrap();

        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 5);
        assert_eq!(order.total_amount.cents(), 2500);
        assert_eq!(inventory.stock_of(product.id).await, Some(5));
    }

    #[tokio::test]
    async fn total_uses_price_snapshots() {
        let (saga, _, inventory, _, _) = setup();
        let tenant: TenantId = "uni-a".into();
        let product = seed_product(&inventory, "uni-a", 500, 10).await;

        let order = saga
            .checkout(tenant.clone(), BuyerId::new(), cart(product.id, 2))
            .await
            .unwrap();

        // A later catalog price change leaves the stored snapshot alone.
        let mut updated = inventory.find_product(product.id).await.unwrap().unwrap();
        updated.price = Money::from_cents(9999);
        inventory.insert_product(updated).await.unwrap();

        assert_eq!(order.items[0].unit_price.cents(), 500);
        assert_eq!(order.total_amount.cents(), 1000);
    }

    #[tokio::test]
    async fn payment_transport_failure_cancels_without_compensation() {
        let (saga, orders, inventory, gateway, publisher) = setup();
        let tenant: TenantId = "uni-a".into();
        let product = seed_product(&inventory, "uni-a", 500, 10).await;
        gateway.set_fail_on_authorize(true);

        let err = saga
            .checkout(tenant.clone(), BuyerId::new(), cart(product.id, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::PaymentUnavailable(_)));

        // Order is terminal, stock untouched, no cancel issued.
        let stored = all_orders_status(&orders, &tenant).await;
        assert_eq!(stored, vec![OrderStatus::Canceled]);
        assert_eq!(inventory.stock_of(product.id).await, Some(10));
        assert_eq!(gateway.cancel_calls(), 0);
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn payment_decline_cancels_without_compensation() {
        let (saga, orders, inventory, gateway, _) = setup();
        let tenant: TenantId = "uni-a".into();
        let product = seed_product(&inventory, "uni-a", 500, 10).await;
        gateway.set_decline_on_authorize(true);

        let err = saga
            .checkout(tenant.clone(), BuyerId::new(), cart(product.id, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::PaymentDeclined));

        let stored = all_orders_status(&orders, &tenant).await;
        assert_eq!(stored, vec![OrderStatus::Canceled]);
        assert_eq!(inventory.stock_of(product.id).await, Some(10));
        assert_eq!(gateway.cancel_calls(), 0);
    }

    #[tokio::test]
    async fn authorize_timeout_is_treated_as_unavailable() {
        let (saga, orders, inventory, gateway, _) = setup();
        let saga = saga.with_payment_timeout(Duration::from_millis(20));
        let tenant: TenantId = "uni-a".into();
        let product = seed_product(&inventory, "uni-a", 500, 10).await;
        gateway.set_authorize_delay(Duration::from_millis(200));

        let err = saga
            .checkout(tenant.clone(), BuyerId::new(), cart(product.id, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::PaymentUnavailable(_)));

        let stored = all_orders_status(&orders, &tenant).await;
        assert_eq!(stored, vec![OrderStatus::Canceled]);
        assert_eq!(inventory.stock_of(product.id).await, Some(10));
        assert_eq!(gateway.cancel_calls(), 0);
    }

    #[tokio::test]
    async fn stock_shortfall_compensates_payment_exactly_once() {
        let (saga, orders, inventory, gateway, publisher) = setup();
        let tenant: TenantId = "uni-a".into();
        let product = seed_product(&inventory, "uni-a", 500, 1).await;

        let err = saga
            .checkout(tenant.clone(), BuyerId::new(), cart(product.id, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::InsufficientStock { .. }));

        let stored = all_orders_status(&orders, &tenant).await;
        assert_eq!(stored, vec![OrderStatus::Canceled]);
        assert_eq!(inventory.stock_of(product.id).await, Some(1));
        assert_eq!(gateway.cancel_calls(), 1);
        assert_eq!(gateway.authorization_count(), 0);
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn aborted_commit_leaves_no_partial_decrement() {
        let (saga, _, inventory, gateway, _) = setup();
        let tenant: TenantId = "uni-a".into();
        let plenty = seed_product(&inventory, "uni-a", 500, 10).await;
        let scarce = seed_product(&inventory, "uni-a", 300, 1).await;

        let err = saga
            .checkout(
                tenant.clone(),
                BuyerId::new(),
                vec![
                    CheckoutItem {
                        product_id: plenty.id,
                        quantity: 2,
                    },
                    CheckoutItem {
                        product_id: scarce.id,
                        quantity: 2,
                    },
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::InsufficientStock { .. }));

        // The first item's decrement was rolled back.
        assert_eq!(inventory.stock_of(plenty.id).await, Some(10));
        assert_eq!(inventory.stock_of(scarce.id).await, Some(1));
        assert_eq!(gateway.cancel_calls(), 1);
    }

    #[tokio::test]
    async fn compensation_failure_is_swallowed() {
        let (saga, orders, inventory, gateway, _) = setup();
        let tenant: TenantId = "uni-a".into();
        let product = seed_product(&inventory, "uni-a", 500, 1).await;
        gateway.set_fail_on_cancel(true);

        let err = saga
            .checkout(tenant.clone(), BuyerId::new(), cart(product.id, 2))
            .await
            .unwrap_err();

        // The caller still sees the stock outcome, not the cancel fault.
        assert!(matches!(err, CheckoutError::InsufficientStock { .. }));
        let stored = all_orders_status(&orders, &tenant).await;
        assert_eq!(stored, vec![OrderStatus::Canceled]);
    }

    #[tokio::test]
    async fn publish_failure_does_not_roll_back_confirmation() {
        let (saga, orders, inventory, _, publisher) = setup();
        let tenant: TenantId = "uni-a".into();
        let product = seed_product(&inventory, "uni-a", 500, 10).await;
        publisher.set_fail_on_publish(true);

        let order = saga
            .checkout(tenant.clone(), BuyerId::new(), cart(product.id, 2))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(inventory.stock_of(product.id).await, Some(8));
        let stored = orders.get(order.id, &tenant).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Confirmed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn contended_stock_confirms_exactly_k_of_n() {
        let (saga, _, inventory, gateway, _) = setup();
        let tenant: TenantId = "uni-a".into();
        let product = seed_product(&inventory, "uni-a", 500, 3).await;

        let saga = std::sync::Arc::new(saga);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let saga = saga.clone();
            let tenant = tenant.clone();
            handles.push(tokio::spawn(async move {
                saga.checkout(tenant, BuyerId::new(), cart(product.id, 1))
                    .await
            }));
        }

        let mut confirmed = 0;
        let mut short = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(order) => {
                    assert_eq!(order.status, OrderStatus::Confirmed);
                    confirmed += 1;
                }
                Err(CheckoutError::InsufficientStock { .. }) => short += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(confirmed, 3);
        assert_eq!(short, 5);
        assert_eq!(inventory.stock_of(product.id).await, Some(0));
        // Each losing saga compensated its own authorization.
        assert_eq!(gateway.cancel_calls(), 5);
    }

    async fn all_orders_status(
        orders: &InMemoryOrderStore,
        _tenant: &TenantId,
    ) -> Vec<OrderStatus> {
        orders.all().await.iter().map(|o| o.status).collect()
    }
}
