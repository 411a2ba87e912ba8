//! Checkout saga for the marketplace.
//!
//! This crate orchestrates a multi-step distributed checkout with
//! compensating actions on failure:
//! 1. Create a pending order with price snapshots
//! 2. Authorize payment with the external payment actor
//! 3. Commit inventory decrements and confirm the order
//! 4. Announce the confirmed order (best-effort)
//!
//! Side effects are strictly ordered, which bounds the compensation
//! surface: at most one compensating call (payment cancel) is ever
//! needed, and only after payment was actually authorized.

pub mod error;
pub mod events;
pub mod orchestrator;
pub mod services;

pub use error::CheckoutError;
pub use events::OrderConfirmed;
pub use orchestrator::{CheckoutItem, CheckoutSaga};
pub use services::{
    BroadcastPublisher, EventPublisher, GatewayError, HttpPaymentGateway, InMemoryPaymentGateway,
    InMemoryPublisher, PaymentAuthorization, PaymentGateway, PaymentStatus, PublishError,
};
