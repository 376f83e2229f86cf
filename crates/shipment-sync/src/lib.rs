//! Shipment lifecycle services on top of the carrier adapters.
//!
//! Two services drive the carrier on behalf of orders:
//! 1. [`ShipmentCreationService`] registers a shipment for a confirmed order
//!    and stores the carrier identifiers on it.
//! 2. [`ShipmentSynchronizer`] polls open shipments, records status changes
//!    and notifies customers. It is meant to be triggered periodically.
//!
//! Neither service retries on its own. The synchronizer relies on the next
//! scheduled run to pick up shipments that failed in the current one.

pub mod creation;
pub mod error;
pub mod summary;
pub mod synchronizer;

pub use creation::{CreatedShipment, SenderProfile, ShipmentCreationService};
pub use error::{ShipmentError, SyncError};
pub use summary::{OrderSyncFailure, SyncSummary};
pub use synchronizer::{ShipmentSynchronizer, SyncOptions};
