//! Domain layer for the marketplace checkout system.
//!
//! This crate provides the core data model:
//! - Order and OrderItem with frozen price snapshots
//! - OrderStatus state machine with an explicit transition table
//! - Product inventory record
//! - Money and identifier value objects

pub mod order;
pub mod product;
pub mod status;
pub mod value_objects;

pub use order::Order;
pub use product::Product;
pub use status::OrderStatus;
pub use value_objects::{BuyerId, Money, OrderItem, ProductId};
