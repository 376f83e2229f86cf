//! Value objects for the shipment-relevant part of an order.

use serde::{Deserialize, Serialize};

/// Money amount represented in minor units (kuruş, cents) to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in minor units (e.g., 1000 = 10.00)
    minor: i64,
}

impl Money {
    /// Creates a new Money amount from minor units.
    pub fn from_minor(minor: i64) -> Self {
        Self { minor }
    }

    /// Creates a new Money amount from a whole-unit value.
    pub fn from_major(major: i64) -> Self {
        Self { minor: major * 100 }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { minor: 0 }
    }

    /// Returns the amount in minor units.
    pub fn minor(&self) -> i64 {
        self.minor
    }

    /// Returns the whole-unit portion.
    pub fn major(&self) -> i64 {
        self.minor / 100
    }

    /// Returns the minor-unit remainder after the whole units.
    pub fn minor_part(&self) -> i64 {
        self.minor.abs() % 100
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

/// Renders as a plain decimal (`"1234.50"`), the format the carrier expects
/// for declared values.
impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.minor < 0 {
            write!(f, "-{}.{:02}", self.major().abs(), self.minor_part())
        } else {
            write!(f, "{}.{:02}", self.major(), self.minor_part())
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            minor: self.minor + rhs.minor,
        }
    }
}

/// Where the parcel is delivered.
///
/// `district` is mandatory for shipment creation. An order without one can
/// still exist; the shipment request built from it is rejected locally.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DestinationAddress {
    pub name: String,
    pub phone: String,
    pub address_line: String,
    pub city: String,
    pub district: Option<String>,
    pub postal_code: Option<String>,
}

impl DestinationAddress {
    /// Returns the district, or `None` when it is absent or blank.
    pub fn district(&self) -> Option<&str> {
        self.district
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

/// Physical parcel measurements recorded on the order, if known.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Parcel {
    /// Gross weight in kilograms.
    pub weight_kg: Option<f64>,
    /// Volumetric weight ("desi").
    pub desi: Option<f64>,
}
