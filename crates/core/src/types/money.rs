//! Money in minor currency units.
//!
//! All checkout arithmetic is done on whole cents. Decimal math is only used
//! for tax, and the result is rounded back to cents immediately.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// An amount of money in the smallest unit of its currency (cents for USD).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in minor units. Never negative.
    pub amount_cents: u64,
    /// ISO 4217 currency code.
    pub currency: CurrencyCode,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub const fn new(amount_cents: u64, currency: CurrencyCode) -> Self {
        Self {
            amount_cents,
            currency,
        }
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!(
            "{}{}.{:02}",
            self.currency.symbol(),
            self.amount_cents / 100,
            self.amount_cents % 100
        )
    }
}

/// ISO 4217 currency codes accepted by the checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    CAD,
    EUR,
    GBP,
    AUD,
}

impl CurrencyCode {
    /// The three-letter code sent to the payment platform.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::CAD => "CAD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::AUD => "AUD",
        }
    }

    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when a currency code is not supported.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported currency code: {0}")]
pub struct UnknownCurrency(pub String);

impl FromStr for CurrencyCode {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::USD),
            "CAD" => Ok(Self::CAD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "AUD" => Ok(Self::AUD),
            _ => Err(UnknownCurrency(s.to_string())),
        }
    }
}
