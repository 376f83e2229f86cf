//! Shared types for the shipment integration workspace.

pub mod types;

pub use types::{OrderId, OrderIdParseError};
