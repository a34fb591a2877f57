//! Order totals.
//!
//! Totals are derived only from sanitized lines and server configuration; a
//! client-declared total is never an input. The delivery fee is part of the
//! tax base.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::CheckoutError;
use crate::order::FulfillmentKind;
use crate::sanitize::CheckoutLine;
use crate::types::CurrencyCode;

/// Server-side pricing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingConfig {
    /// Sales tax as a percentage (e.g. `8.875`). Zero disables tax.
    pub tax_rate_percent: Decimal,
    /// Flat fee added to delivery orders. Zero disables the fee.
    pub delivery_fee_cents: u64,
    /// Currency for every amount sent to the payment platform.
    #[serde(default)]
    pub currency: CurrencyCode,
}

impl PricingConfig {
    /// Whether tax applies at all.
    #[must_use]
    pub fn taxes_enabled(&self) -> bool {
        self.tax_rate_percent > Decimal::ZERO
    }

    /// Fee charged for `kind`; zero for pickup.
    #[must_use]
    pub const fn delivery_fee_for(&self, kind: FulfillmentKind) -> u64 {
        match kind {
            FulfillmentKind::Delivery => self.delivery_fee_cents,
            FulfillmentKind::Pickup => 0,
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tax_rate_percent: Decimal::ZERO,
            delivery_fee_cents: 0,
            currency: CurrencyCode::default(),
        }
    }
}

/// Money owed for one checkout, in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    /// Sum of menu lines.
    pub subtotal_cents: u64,
    /// Delivery fee, zero for pickup.
    pub delivery_fee_cents: u64,
    /// Tax on subtotal plus delivery fee.
    pub tax_cents: u64,
    /// Amount to capture.
    pub total_cents: u64,
}

impl Totals {
    /// Subtotal plus delivery fee: the amount tax is computed on.
    #[must_use]
    pub const fn taxable_base_cents(&self) -> u64 {
        self.subtotal_cents + self.delivery_fee_cents
    }
}

/// Compute totals for sanitized `lines`.
///
/// `tax = round(base × rate / 100)` with halves rounded up, where `base` is
/// the subtotal plus any delivery fee.
///
/// # Errors
///
/// Returns [`CheckoutError::InvalidQuantity`] naming the offending line if
/// the amounts overflow.
pub fn compute_totals(
    lines: &[CheckoutLine],
    kind: FulfillmentKind,
    config: &PricingConfig,
) -> Result<Totals, CheckoutError> {
    let mut subtotal_cents: u64 = 0;
    for line in lines {
        subtotal_cents = line
            .line_total_cents()
            .and_then(|amount| subtotal_cents.checked_add(amount))
            .ok_or_else(|| CheckoutError::InvalidQuantity(line.name.clone()))?;
    }

    let delivery_fee_cents = config.delivery_fee_for(kind);
    let overflow = || CheckoutError::InvalidQuantity("order total".to_string());
    let base = subtotal_cents
        .checked_add(delivery_fee_cents)
        .ok_or_else(overflow)?;
    let tax_cents = if config.taxes_enabled() {
        tax_on(base, config.tax_rate_percent).ok_or_else(overflow)?
    } else {
        0
    };
    let total_cents = base.checked_add(tax_cents).ok_or_else(overflow)?;

    Ok(Totals {
        subtotal_cents,
        delivery_fee_cents,
        tax_cents,
        total_cents,
    })
}

fn tax_on(base_cents: u64, rate_percent: Decimal) -> Option<u64> {
    Decimal::from(base_cents)
        .checked_mul(rate_percent)?
        .checked_div(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn fries(quantity: u32) -> CheckoutLine {
        CheckoutLine {
            name: "Small Fries".to_string(),
            quantity,
            unit_price_cents: 299,
        }
    }

    fn config(rate: Decimal, fee: u64) -> PricingConfig {
        PricingConfig {
            tax_rate_percent: rate,
            delivery_fee_cents: fee,
            currency: CurrencyCode::USD,
        }
    }

    #[test]
    fn test_pickup_totals() {
        let totals =
            compute_totals(&[fries(2)], FulfillmentKind::Pickup, &config(Decimal::from(8), 300))
                .unwrap();
        assert_eq!(
            totals,
            Totals {
                subtotal_cents: 598,
                delivery_fee_cents: 0,
                tax_cents: 48,
                total_cents: 646,
            }
        );
    }

    #[test]
    fn test_delivery_fee_is_taxed() {
        let totals = compute_totals(
            &[fries(2)],
            FulfillmentKind::Delivery,
            &config(Decimal::from(8), 300),
        )
        .unwrap();
        assert_eq!(totals.subtotal_cents, 598);
        assert_eq!(totals.delivery_fee_cents, 300);
        assert_eq!(totals.taxable_base_cents(), 898);
        assert_eq!(totals.tax_cents, 72);
        assert_eq!(totals.total_cents, 970);
    }

    #[test]
    fn test_zero_rate_means_zero_tax() {
        let totals =
            compute_totals(&[fries(3)], FulfillmentKind::Delivery, &config(Decimal::ZERO, 250))
                .unwrap();
        assert_eq!(totals.tax_cents, 0);
        assert_eq!(totals.total_cents, 897 + 250);
    }

    #[test]
    fn test_zero_fee_on_delivery() {
        let totals =
            compute_totals(&[fries(1)], FulfillmentKind::Delivery, &config(Decimal::ZERO, 0))
                .unwrap();
        assert_eq!(totals.delivery_fee_cents, 0);
        assert_eq!(totals.total_cents, 299);
    }

    #[test]
    fn test_tax_rounds_half_up() {
        // 50 × 1% = 0.5 → 1
        let line = CheckoutLine {
            name: "Mint".to_string(),
            quantity: 1,
            unit_price_cents: 50,
        };
        let totals =
            compute_totals(&[line], FulfillmentKind::Pickup, &config(Decimal::ONE, 0)).unwrap();
        assert_eq!(totals.tax_cents, 1);

        // 49 × 1% = 0.49 → 0
        let line = CheckoutLine {
            name: "Mint".to_string(),
            quantity: 1,
            unit_price_cents: 49,
        };
        let totals =
            compute_totals(&[line], FulfillmentKind::Pickup, &config(Decimal::ONE, 0)).unwrap();
        assert_eq!(totals.tax_cents, 0);
    }

    #[test]
    fn test_fractional_rate() {
        // 1000 × 8.875% = 88.75 → 89
        let line = CheckoutLine {
            name: "Platter".to_string(),
            quantity: 1,
            unit_price_cents: 1000,
        };
        let rate = Decimal::new(8875, 3);
        let totals = compute_totals(&[line], FulfillmentKind::Pickup, &config(rate, 0)).unwrap();
        assert_eq!(totals.tax_cents, 89);
        assert_eq!(totals.total_cents, 1089);
    }

    #[test]
    fn test_overflow_is_an_error() {
        let line = CheckoutLine {
            name: "Gold Burger".to_string(),
            quantity: 2,
            unit_price_cents: u64::MAX,
        };
        assert_eq!(
            compute_totals(&[line], FulfillmentKind::Pickup, &PricingConfig::default()),
            Err(CheckoutError::InvalidQuantity("Gold Burger".to_string()))
        );
    }
}
