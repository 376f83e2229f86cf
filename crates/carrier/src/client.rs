//! The carrier capability consumed by the shipment services.

use async_trait::async_trait;

use crate::create::{ShipmentRequest, ShipmentResult, SoapShipmentClient};
use crate::error::Result;
use crate::query::{QueryIdentifier, StatusQueryClient, StatusResult};

/// Shipment creation and status tracking with one carrier.
#[async_trait]
pub trait CarrierClient: Send + Sync {
    /// Name stored on shipment records.
    fn carrier_name(&self) -> &str;

    /// Registers a new shipment.
    async fn create_shipment(&self, request: &ShipmentRequest) -> Result<ShipmentResult>;

    /// Returns the carrier's current view of a shipment.
    async fn query_status(&self, identifier: &QueryIdentifier) -> Result<StatusResult>;
}

/// Both legacy endpoints of the carrier behind one [`CarrierClient`].
///
/// The two adapters share nothing but HTTP plumbing: each owns its
/// credentials, envelope format and response parsing.
#[derive(Debug, Clone)]
pub struct CarrierGateway {
    name: String,
    creator: SoapShipmentClient,
    tracker: StatusQueryClient,
}

impl CarrierGateway {
    pub fn new(
        name: impl Into<String>,
        creator: SoapShipmentClient,
        tracker: StatusQueryClient,
    ) -> Self {
        Self {
            name: name.into(),
            creator,
            tracker,
        }
    }
}

#[async_trait]
impl CarrierClient for CarrierGateway {
    fn carrier_name(&self) -> &str {
        &self.name
    }

    async fn create_shipment(&self, request: &ShipmentRequest) -> Result<ShipmentResult> {
        self.creator.create_shipment(request).await
    }

    async fn query_status(&self, identifier: &QueryIdentifier) -> Result<StatusResult> {
        self.tracker.query_status(identifier).await
    }
}
