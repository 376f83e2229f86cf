//! Error types for the shipment services.

use carrier::CarrierError;
use common::OrderId;
use domain::{DomainError, OrderState};
use thiserror::Error;

/// Errors that abort a synchronization run.
///
/// Failures for individual orders never abort a run; they are reported in
/// the [`SyncSummary`](crate::SyncSummary) instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The list of shipments to poll could not be loaded.
    #[error("Could not fetch pending shipments: {0}")]
    CandidateFetch(#[source] DomainError),

    /// Another run is still in progress.
    #[error("A shipment sync run is already in progress")]
    AlreadyRunning,
}

/// Errors raised while creating a shipment for an order.
#[derive(Debug, Error)]
pub enum ShipmentError {
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order is not in a state that allows shipment creation.
    #[error("Order {order_id} is {state}, expected Confirmed")]
    NotReady { order_id: OrderId, state: OrderState },

    /// The order already carries carrier identifiers.
    #[error("Order {0} already has a shipment")]
    AlreadyCreated(OrderId),

    #[error(transparent)]
    Carrier(#[from] CarrierError),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

/// Per-order failure inside a synchronization run.
#[derive(Debug, Error)]
pub(crate) enum OrderSyncError {
    #[error("shipment has neither an integration code nor a tracking number")]
    NoQueryIdentifier,

    #[error(transparent)]
    Carrier(#[from] CarrierError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl OrderSyncError {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            OrderSyncError::NoQueryIdentifier => "missing_identifier",
            OrderSyncError::Carrier(e) => e.kind().as_str(),
            OrderSyncError::Domain(_) => "repository",
        }
    }
}
