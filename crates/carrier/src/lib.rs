//! Adapters for the carrier's two legacy endpoints.
//!
//! The carrier exposes two structurally different integrations:
//! - a flat SOAP/XML endpoint for creating shipments ([`SoapShipmentClient`])
//! - a WCF endpoint taking CDATA-wrapped XML fragments and answering with
//!   entity-encoded JSON inside an XML result tag ([`StatusQueryClient`])
//!
//! Both sit behind the [`CarrierClient`] capability. Requests are built from
//! string templates and responses are read with tolerant tag extraction
//! ([`xml`]), since the provider's schema varies between API versions.

pub mod client;
pub mod config;
pub mod create;
pub mod error;
pub mod memory;
pub mod query;
pub mod status_map;
mod transport;
pub mod xml;

pub use client::{CarrierClient, CarrierGateway};
pub use config::{Credentials, EndpointConfig};
pub use create::{
    DEFAULT_DESI, DEFAULT_WEIGHT_KG, Party, PaymentResponsibility, ShipmentRequest,
    ShipmentResult, SoapShipmentClient,
};
pub use error::{CarrierError, ErrorKind, ParseStage, Result};
pub use memory::InMemoryCarrierClient;
pub use query::{QueryIdentifier, QueryMode, StatusQueryClient, StatusResult};
pub use status_map::{StatusLookup, map_status_code};
pub use xml::SoapFault;
