//! Interfaces to the collaborators that own orders and customer email.

use async_trait::async_trait;
use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::order::Order;
use crate::shipment::ShipmentStatus;

/// Identifiers written to an order once the carrier accepts its shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedIdentifiers {
    pub carrier_name: String,
    pub integration_code: String,
    pub barcode_number: String,
    pub tracking_number: Option<String>,
}

/// Read/update access to the order store.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Loads a single order.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Returns orders whose shipment has a barcode and is not delivered,
    /// most recently shipped first, at most `limit` of them.
    async fn fetch_pending_shipments(&self, limit: usize) -> Result<Vec<Order>>;

    /// Records a new shipment status. `tracking_number` and `tracking_url`
    /// overwrite the stored values only when present.
    async fn update_shipment_status(
        &self,
        order_id: OrderId,
        status: ShipmentStatus,
        tracking_number: Option<String>,
        tracking_url: Option<String>,
    ) -> Result<()>;

    /// Stores the carrier identifiers and moves the order to ready-to-ship.
    async fn persist_shipment_identifiers(
        &self,
        order_id: OrderId,
        identifiers: PersistedIdentifiers,
    ) -> Result<()>;
}

/// Sends customer-facing shipment notifications.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Notifies the customer that their shipment reached `status`.
    async fn send_shipment_status_email(&self, order: &Order, status: ShipmentStatus)
    -> Result<()>;
}
