//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Status transitions:
/// ```text
/// Pending ──┬──► Confirmed
///           └──► Canceled
/// ```
///
/// Both Confirmed and Canceled are terminal; an order never re-enters
/// Pending and never moves between the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order is persisted but the saga has not reached a terminal step.
    #[default]
    Pending,

    /// Payment authorized and inventory committed (terminal state).
    Confirmed,

    /// The saga aborted and compensated (terminal state).
    Canceled,
}

impl OrderStatus {
    /// Returns true if `self → to` is a legal transition.
    ///
    /// The transition table is exhaustive so that adding a status
    /// forces this match to be revisited.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        matches!(
            (self, to),
            (OrderStatus::Pending, OrderStatus::Confirmed)
                | (OrderStatus::Pending, OrderStatus::Canceled)
        )
    }

    /// Returns true if this is a terminal status (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Confirmed | OrderStatus::Canceled)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Canceled => "Canceled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
