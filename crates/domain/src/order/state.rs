//! Order fulfillment state as far as shipping is concerned.

use serde::{Deserialize, Serialize};

/// The fulfillment state of an order.
///
/// State transitions driven by this crate's collaborators:
/// ```text
/// Confirmed ──► ReadyToShip ──► Shipped ──► Delivered
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderState {
    /// Paid and confirmed, no shipment yet.
    #[default]
    Confirmed,

    /// Shipment identifiers have been registered with the carrier.
    ReadyToShip,

    /// The carrier reported movement for the shipment.
    Shipped,

    /// The carrier reported delivery (terminal state).
    Delivered,
}

impl OrderState {
    /// Returns true if a shipment may be created in this state.
    pub fn can_create_shipment(&self) -> bool {
        matches!(self, OrderState::Confirmed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Confirmed => "Confirmed",
            OrderState::ReadyToShip => "ReadyToShip",
            OrderState::Shipped => "Shipped",
            OrderState::Delivered => "Delivered",
        }
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
