//! Domain error types.

use common::OrderId;
use thiserror::Error;

/// Errors raised by the order store and notification collaborators.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No order exists with the given ID.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order has no shipment record to update.
    #[error("Order {0} has no shipment")]
    ShipmentMissing(OrderId),

    /// The order store could not complete the operation.
    #[error("Order repository error: {0}")]
    Repository(String),

    /// The notification sender rejected the message.
    #[error("Notification error: {0}")]
    Notification(String),
}

/// Convenience type alias for domain results.
pub type Result<T> = std::result::Result<T, DomainError>;
