//! Shipment record, status taxonomy and carrier identifier derivation.

mod identifiers;
mod record;
mod status;

pub use identifiers::{
    AttemptContext, BARCODE_SUFFIX, INTEGRATION_CODE_LEN, MAX_WAYBILL_LEN, ShipmentIdentifiers,
    conventional_barcode, derive_identifiers, is_valid_integration_code,
};
pub use record::Shipment;
pub use status::ShipmentStatus;
