//! Order record as seen by the shipment integration.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

use super::{DestinationAddress, Money, OrderState, Parcel};
use crate::shipment::{Shipment, ShipmentStatus};

/// An order, reduced to the fields the shipment integration reads or writes.
///
/// The order-management system owns everything here except `shipment`,
/// which this workspace owns once a shipment exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Human-readable order number; the seed for derived carrier identifiers.
    pub order_number: String,
    pub customer_email: String,
    pub total_amount: Money,
    pub destination: DestinationAddress,
    pub parcel: Parcel,
    pub state: OrderState,
    pub placed_at: DateTime<Utc>,
    pub shipment: Option<Shipment>,
}

impl Order {
    /// Creates a confirmed order with no shipment.
    pub fn new(
        order_number: impl Into<String>,
        customer_email: impl Into<String>,
        total_amount: Money,
        destination: DestinationAddress,
    ) -> Self {
        Self {
            id: OrderId::new(),
            order_number: order_number.into(),
            customer_email: customer_email.into(),
            total_amount,
            destination,
            parcel: Parcel::default(),
            state: OrderState::Confirmed,
            placed_at: Utc::now(),
            shipment: None,
        }
    }

    /// Sets the parcel measurements.
    pub fn with_parcel(mut self, parcel: Parcel) -> Self {
        self.parcel = parcel;
        self
    }

    /// Attaches an existing shipment record.
    pub fn with_shipment(mut self, shipment: Shipment) -> Self {
        self.shipment = Some(shipment);
        self
    }

    /// Returns the current shipment status, if a shipment exists and has been polled.
    pub fn shipment_status(&self) -> Option<ShipmentStatus> {
        self.shipment.as_ref().and_then(|s| s.status)
    }

    /// Returns true if the shipment should be polled: a barcode is present
    /// and the carrier has not reported delivery.
    pub fn awaits_status_sync(&self) -> bool {
        self.shipment.as_ref().is_some_and(|s| {
            s.barcode_number.as_deref().is_some_and(|b| !b.is_empty())
                && s.status != Some(ShipmentStatus::Delivered)
        })
    }
}
