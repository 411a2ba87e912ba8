//! External collaborators consumed by the saga.

pub mod payment;
pub mod publisher;

pub use payment::{
    GatewayError, HttpPaymentGateway, InMemoryPaymentGateway, PaymentAuthorization,
    PaymentGateway, PaymentStatus,
};
pub use publisher::{BroadcastPublisher, EventPublisher, InMemoryPublisher, PublishError};
