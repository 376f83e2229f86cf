use serde::{Deserialize, Serialize};

/// Carrier-independent shipment status.
///
/// ```text
/// Received ──► InTransit ──► AtBranch ──► OutForDelivery ──┬──► Delivered
///                                                         └──► NotDelivered
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Received,
    InTransit,
    AtBranch,
    OutForDelivery,
    Delivered,
    NotDelivered,
}

impl ShipmentStatus {
    /// Position in the forward lifecycle. Both outcomes share the final rank.
    pub fn rank(&self) -> u8 {
        match self {
            ShipmentStatus::Received => 0,
            ShipmentStatus::InTransit => 1,
            ShipmentStatus::AtBranch => 2,
            ShipmentStatus::OutForDelivery => 3,
            ShipmentStatus::Delivered | ShipmentStatus::NotDelivered => 4,
        }
    }

    /// Returns true if moving from `previous` to `self` goes backwards.
    pub fn is_regression_from(&self, previous: ShipmentStatus) -> bool {
        self.rank() < previous.rank()
    }

    /// Returns true if the parcel reached the recipient.
    pub fn is_delivered(&self) -> bool {
        matches!(self, ShipmentStatus::Delivered)
    }

    /// Returns the wire/storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Received => "RECEIVED",
            ShipmentStatus::InTransit => "IN_TRANSIT",
            ShipmentStatus::AtBranch => "AT_BRANCH",
            ShipmentStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            ShipmentStatus::Delivered => "DELIVERED",
            ShipmentStatus::NotDelivered => "NOT_DELIVERED",
        }
    }

    /// Returns a customer-facing description.
    pub fn label(&self) -> &'static str {
        match self {
            ShipmentStatus::Received => "Received by the carrier",
            ShipmentStatus::InTransit => "In transit",
            ShipmentStatus::AtBranch => "At the delivery branch",
            ShipmentStatus::OutForDelivery => "Out for delivery",
            ShipmentStatus::Delivered => "Delivered",
            ShipmentStatus::NotDelivered => "Delivery attempt failed",
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
