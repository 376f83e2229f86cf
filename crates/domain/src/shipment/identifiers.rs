//! Derivation of the identifiers the carrier requires for a new shipment.
//!
//! The carrier needs three references per shipment:
//! - a trading waybill number, at most 16 characters, taken from the order number
//! - a 16-digit integration code used for status queries
//! - a barcode number, assigned by the carrier and conventionally the
//!   integration code followed by `"1"`
//!
//! Order numbers longer than 16 characters are truncated for the waybill
//! without error. Two orders sharing the same first 16 characters collide on
//! the waybill; the integration code stays distinct.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Maximum length of the trading waybill number.
pub const MAX_WAYBILL_LEN: usize = 16;

/// Exact length of the integration code.
pub const INTEGRATION_CODE_LEN: usize = 16;

/// Suffix the carrier appends to the integration code to form the barcode.
pub const BARCODE_SUFFIX: &str = "1";

/// Digits taken from the end of the order number.
const ORDER_DIGITS: usize = 6;

/// `10^8`: the timestamp contributes its last 8 digits.
const TIMESTAMP_MODULUS: u64 = 100_000_000;

/// The non-deterministic inputs of one shipment-creation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptContext {
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    /// Random draw; only its value modulo 100 is used.
    pub random: u8,
}

impl AttemptContext {
    /// Creates a context from explicit values.
    pub fn new(timestamp_ms: i64, random: u8) -> Self {
        Self {
            timestamp_ms,
            random,
        }
    }

    /// Draws the current wall-clock time and a random digit pair.
    pub fn now() -> Self {
        Self {
            timestamp_ms: Utc::now().timestamp_millis(),
            random: rand::thread_rng().gen_range(0..100),
        }
    }
}

/// The identifiers sent to the carrier when creating a shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentIdentifiers {
    pub trading_waybill_number: String,
    pub integration_code: String,
    /// Expected barcode; the carrier's value replaces it once received.
    pub barcode_number: String,
}

/// Derives the carrier identifiers for an order.
///
/// Deterministic for a given `(order_number, ctx)`. Never fails: an order
/// number without digits falls back to the timestamp as its numeric seed.
pub fn derive_identifiers(order_number: &str, ctx: AttemptContext) -> ShipmentIdentifiers {
    let trading_waybill_number: String = order_number.chars().take(MAX_WAYBILL_LEN).collect();

    let timestamp = ctx.timestamp_ms.unsigned_abs();
    let digits: String = order_number.chars().filter(char::is_ascii_digit).collect();
    let seed = if digits.is_empty() {
        timestamp.to_string()
    } else {
        digits
    };

    let integration_code = format!(
        "{}{:08}{:02}",
        trailing_digits(&seed, ORDER_DIGITS),
        timestamp % TIMESTAMP_MODULUS,
        ctx.random % 100
    );

    ShipmentIdentifiers {
        barcode_number: conventional_barcode(&integration_code),
        trading_waybill_number,
        integration_code,
    }
}

/// Returns the barcode the carrier conventionally assigns to an integration code.
pub fn conventional_barcode(integration_code: &str) -> String {
    format!("{integration_code}{BARCODE_SUFFIX}")
}

/// Returns true if `code` is exactly 16 ASCII digits.
pub fn is_valid_integration_code(code: &str) -> bool {
    code.len() == INTEGRATION_CODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}

/// Last `n` characters of an ASCII digit string, left-padded with zeros.
fn trailing_digits(digits: &str, n: usize) -> String {
    if digits.len() >= n {
        digits[digits.len() - n..].to_string()
    } else {
        format!("{digits:0>n$}")
    }
}
