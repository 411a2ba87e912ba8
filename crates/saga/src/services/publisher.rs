//! Event publisher trait with broadcast and in-memory implementations.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::events::OrderConfirmed;

/// Errors raised by a publisher implementation.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The broker or channel rejected the event.
    #[error("Event publish failed: {0}")]
    Publish(String),
}

/// Trait for best-effort broadcast of confirmed-order facts.
///
/// `name` is the routing key consumers filter on. Fire-and-forget from
/// the saga's point of view: the orchestrator logs a publish failure
/// and moves on, since the order has already legitimately consumed
/// inventory and payment.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes one confirmed-order fact under a routing key.
    async fn publish(&self, name: &str, event: &OrderConfirmed) -> Result<(), PublishError>;
}

/// Publisher backed by a tokio broadcast channel.
///
/// Every subscriber sees every `(routing key, event)` pair published
/// after it subscribed (at-least-once within the process; a slow
/// subscriber that lags past the channel capacity misses the oldest
/// events). Zero subscribers is not an error.
#[derive(Debug, Clone)]
pub struct BroadcastPublisher {
    sender: broadcast::Sender<(String, OrderConfirmed)>,
}

impl BroadcastPublisher {
    /// Creates a publisher with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to confirmed-order facts.
    pub fn subscribe(&self) -> broadcast::Receiver<(String, OrderConfirmed)> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastPublisher {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl EventPublisher for BroadcastPublisher {
    async fn publish(&self, name: &str, event: &OrderConfirmed) -> Result<(), PublishError> {
        // send only errors when there are no receivers, which is fine
        // for a fire-and-forget broadcast.
        let _ = self.sender.send((name.to_string(), event.clone()));
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryPublisherState {
    published: Vec<(String, OrderConfirmed)>,
    fail_on_publish: bool,
}

/// In-memory publisher for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPublisher {
    state: Arc<RwLock<InMemoryPublisherState>>,
}

impl InMemoryPublisher {
    /// Creates a new in-memory publisher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes publish calls fail.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.state.write().unwrap().fail_on_publish = fail;
    }

    /// Returns the events published so far.
    pub fn published(&self) -> Vec<OrderConfirmed> {
        self.state
            .read()
            .unwrap()
            .published
            .iter()
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// Returns the routing keys published so far.
    pub fn published_names(&self) -> Vec<String> {
        self.state
            .read()
            .unwrap()
            .published
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[async_trait]
impl EventPublisher for InMemoryPublisher {
    async fn publish(&self, name: &str, event: &OrderConfirmed) -> Result<(), PublishError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_publish {
            return Err(PublishError::Publish("broker unavailable".to_string()));
        }
        state.published.push((name.to_string(), event.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::OrderId;
    use domain::{BuyerId, Money};

    fn sample_event() -> OrderConfirmed {
        OrderConfirmed {
            order_id: OrderId::new(),
            buyer_id: BuyerId::new(),
            tenant_id: "uni-a".into(),
            total_amount: Money::from_cents(1000),
            confirmed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_all_subscribers() {
        let publisher = BroadcastPublisher::new(8);
        let mut rx1 = publisher.subscribe();
        let mut rx2 = publisher.subscribe();

        let event = sample_event();
        publisher
            .publish(OrderConfirmed::NAME, &event)
            .await
            .unwrap();

        let (name, received) = rx1.recv().await.unwrap();
        assert_eq!(name, OrderConfirmed::NAME);
        assert_eq!(received, event);
        assert_eq!(rx2.recv().await.unwrap().1, event);
    }

    #[tokio::test]
    async fn broadcast_without_subscribers_is_ok() {
        let publisher = BroadcastPublisher::new(8);
        publisher
            .publish(OrderConfirmed::NAME, &sample_event())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn in_memory_publisher_records_events_and_names() {
        let publisher = InMemoryPublisher::new();
        let event = sample_event();

        publisher
            .publish(OrderConfirmed::NAME, &event)
            .await
            .unwrap();
        assert_eq!(publisher.published(), vec![event]);
        assert_eq!(
            publisher.published_names(),
            vec![OrderConfirmed::NAME.to_string()]
        );
    }

    #[tokio::test]
    async fn in_memory_publisher_can_fail() {
        let publisher = InMemoryPublisher::new();
        publisher.set_fail_on_publish(true);

        let result = publisher.publish(OrderConfirmed::NAME, &sample_event()).await;
        assert!(matches!(result, Err(PublishError::Publish(_))));
        assert!(publisher.published().is_empty());
    }
}
