use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ShipmentStatus;

/// Shipment data stored on an order.
///
/// Identifiers are written once when the carrier accepts the shipment;
/// `status`, `tracking_number` and `tracking_url` are refreshed by the
/// status synchronizer. `status` stays `None` until the first poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub carrier_name: String,
    pub created_at: DateTime<Utc>,
    pub status: Option<ShipmentStatus>,
    pub tracking_number: Option<String>,
    pub barcode_number: Option<String>,
    pub integration_code: Option<String>,
    pub tracking_url: Option<String>,
}

impl Shipment {
    /// Creates an empty shipment record for the given carrier.
    pub fn new(carrier_name: impl Into<String>) -> Self {
        Self {
            carrier_name: carrier_name.into(),
            created_at: Utc::now(),
            status: None,
            tracking_number: None,
            barcode_number: None,
            integration_code: None,
            tracking_url: None,
        }
    }
}
