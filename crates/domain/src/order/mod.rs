//! The shipment-relevant subset of an order.

mod model;
mod state;
mod value_objects;

pub use model::Order;
pub use state::OrderState;
pub use value_objects::{DestinationAddress, Money, Parcel};
