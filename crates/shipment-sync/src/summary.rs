//! Result of a synchronization run.

use common::OrderId;
use serde::Serialize;

/// A shipment that could not be synchronized in this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSyncFailure {
    pub order_id: OrderId,
    pub order_number: String,
    /// Error class (`transport`, `fault`, `repository`, ...).
    pub kind: String,
    pub error: String,
}

/// Counters reported by [`ShipmentSynchronizer::run`](crate::ShipmentSynchronizer::run).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    /// Shipments handled, whatever the outcome.
    pub processed: usize,
    /// Shipments whose status changed and was persisted.
    pub updated: usize,
    /// Status emails sent successfully.
    pub notified: usize,
    /// Shipments for which the carrier reported no usable status.
    pub skipped: usize,
    pub errors: Vec<OrderSyncFailure>,
    pub duration_ms: u64,
    /// True if the run stopped before handling every candidate.
    pub cancelled: bool,
}

impl SyncSummary {
    /// Shipments handled without a change.
    pub fn unchanged(&self) -> usize {
        self.processed - self.updated - self.skipped - self.errors.len()
    }
}
