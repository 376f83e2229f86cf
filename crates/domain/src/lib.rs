//! Domain layer for the carrier shipment integration.
//!
//! This crate provides:
//! - The shipment-relevant subset of an order (destination, parcel, shipment record)
//! - The carrier-independent shipment status taxonomy
//! - The identifier engine deriving waybill and integration codes from order numbers
//! - Collaborator interfaces for the order store and the notification sender,
//!   plus in-memory implementations

pub mod error;
pub mod memory;
pub mod order;
pub mod ports;
pub mod shipment;

pub use error::{DomainError, Result};
pub use memory::{InMemoryNotificationSender, InMemoryOrderRepository, SentNotification};
pub use order::{DestinationAddress, Money, Order, OrderState, Parcel};
pub use ports::{NotificationSender, OrderRepository, PersistedIdentifiers};
pub use shipment::{
    AttemptContext, Shipment, ShipmentIdentifiers, ShipmentStatus, conventional_barcode,
    derive_identifiers, is_valid_integration_code,
};
