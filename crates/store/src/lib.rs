//! Durable state for the checkout saga.
//!
//! Two stores with deliberately narrow contracts:
//! - [`OrderStore`]: order records with guarded compare-and-set status
//!   transitions.
//! - [`InventoryLedger`]: per-product stock counters with an exclusive
//!   check-and-decrement primitive.
//!
//! Each store commits its own state before the saga moves to the next
//! step; no transaction spans the two.

pub mod error;
pub mod inventory;
pub mod orders;

pub use error::{LedgerError, StoreError};
pub use inventory::{InMemoryInventoryLedger, InventoryLedger};
pub use orders::{InMemoryOrderStore, OrderStore};
