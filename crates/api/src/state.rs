//! Shared application state.

use carrier::CarrierClient;
use domain::{InMemoryNotificationSender, InMemoryOrderRepository};
use shipment_sync::{ShipmentCreationService, ShipmentSynchronizer};
use tokio_util::sync::CancellationToken;

use crate::auth::BearerAuth;

/// Shared application state accessible from all handlers.
///
/// Generic over the carrier so tests can run the full router against a
/// scripted carrier.
pub struct AppState<C: CarrierClient> {
    pub carrier_name: String,
    pub repository: InMemoryOrderRepository,
    pub notifier: InMemoryNotificationSender,
    pub synchronizer:
        ShipmentSynchronizer<InMemoryOrderRepository, C, InMemoryNotificationSender>,
    pub creation: ShipmentCreationService<InMemoryOrderRepository, C>,
    pub auth: BearerAuth,
    /// Cancelled on shutdown; a running sync stops after the current order.
    /// Each trigger also cancels its own child token when the caller goes away.
    pub shutdown: CancellationToken,
}
