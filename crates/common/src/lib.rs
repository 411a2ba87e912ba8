//! Shared identifier types for the marketplace checkout system.

pub mod types;

pub use types::{OrderId, TenantId};
