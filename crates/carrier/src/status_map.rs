//! Carrier status codes and their mapping to [`ShipmentStatus`].

use domain::ShipmentStatus;

/// The carrier's documented status codes.
const STATUS_TABLE: [(&str, ShipmentStatus); 6] = [
    ("1", ShipmentStatus::Received),
    ("2", ShipmentStatus::InTransit),
    ("3", ShipmentStatus::AtBranch),
    ("4", ShipmentStatus::OutForDelivery),
    ("5", ShipmentStatus::Delivered),
    ("6", ShipmentStatus::NotDelivered),
];

/// Outcome of looking up a carrier status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLookup {
    /// A documented code.
    Known(ShipmentStatus),
    /// A code outside the table, kept verbatim for logging.
    Unknown(String),
    /// The response carried no status code.
    Missing,
}

impl StatusLookup {
    /// Returns the mapped status, if the code was known.
    pub fn known(&self) -> Option<ShipmentStatus> {
        match self {
            StatusLookup::Known(status) => Some(*status),
            _ => None,
        }
    }
}

/// Maps a raw carrier status code. Never fails.
///
/// Surrounding whitespace and leading zeros are ignored (`"05"` is `"5"`).
pub fn map_status_code(code: &str) -> StatusLookup {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return StatusLookup::Missing;
    }
    let normalized = match trimmed.trim_start_matches('0') {
        "" => "0",
        rest => rest,
    };
    STATUS_TABLE
        .iter()
        .find(|(c, _)| *c == normalized)
        .map(|(_, status)| StatusLookup::Known(*status))
        .unwrap_or_else(|| StatusLookup::Unknown(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_documented_code_is_known() {
        for (code, status) in STATUS_TABLE {
            assert_eq!(map_status_code(code), StatusLookup::Known(status));
        }
    }

    #[test]
    fn test_code_normalization() {
        assert_eq!(
            map_status_code(" 05 "),
            StatusLookup::Known(ShipmentStatus::Delivered)
        );
    }

    #[test]
    fn test_unknown_and_missing_codes() {
        assert_eq!(map_status_code("0"), StatusLookup::Unknown("0".to_string()));
        assert_eq!(map_status_code("99"), StatusLookup::Unknown("99".to_string()));
        assert_eq!(map_status_code("X"), StatusLookup::Unknown("X".to_string()));
        assert_eq!(map_status_code(""), StatusLookup::Missing);
        assert_eq!(StatusLookup::Unknown("99".to_string()).known(), None);
    }
}
