//! Client-side cart model.
//!
//! This is the shape the browser keeps in local storage. Its prices are for
//! display only: the server re-prices every line at checkout. Quantity input
//! here is forgiving ([`parse_quantity`] never fails), unlike the strict
//! validation in [`crate::sanitize`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sanitize::{CartItemInput, MAX_LINE_QUANTITY};

/// One row of the persisted cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartRow {
    pub name: String,
    pub unit_price_cents: u64,
    pub quantity: u32,
}

/// Coerce arbitrary quantity input into `1..=MAX_LINE_QUANTITY`.
///
/// Fractions are floored, anything below one or unparseable becomes one, and
/// anything above the maximum is clamped.
#[must_use]
pub fn parse_quantity(raw: Option<&Value>) -> u32 {
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(f) if f.is_finite() && f >= 1.0 => {
            let max = f64::from(MAX_LINE_QUANTITY);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped
            let quantity = f.floor().min(max) as u32;
            quantity
        }
        _ => 1,
    }
}

/// The browser cart: an ordered list of rows keyed by item name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    rows: Vec<CartRow>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Rows in insertion order.
    #[must_use]
    pub fn rows(&self) -> &[CartRow] {
        &self.rows
    }

    /// Whether the cart has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Add `quantity` of an item, merging with an existing row of the same
    /// name. The displayed price is refreshed to the latest one seen.
    pub fn add(&mut self, name: &str, unit_price_cents: u64, quantity: Option<&Value>) {
        let quantity = parse_quantity(quantity);
        if let Some(row) = self.rows.iter_mut().find(|row| row.name == name) {
            row.quantity = row.quantity.saturating_add(quantity).min(MAX_LINE_QUANTITY);
            row.unit_price_cents = unit_price_cents;
        } else {
            self.rows.push(CartRow {
                name: name.to_string(),
                unit_price_cents,
                quantity,
            });
        }
    }

    /// Remove the row for `name`, if present.
    pub fn remove(&mut self, name: &str) {
        self.rows.retain(|row| row.name != name);
    }

    /// Set the quantity of an existing row. Unknown names are ignored.
    pub fn set_quantity(&mut self, name: &str, quantity: Option<&Value>) {
        if let Some(row) = self.rows.iter_mut().find(|row| row.name == name) {
            row.quantity = parse_quantity(quantity);
        }
    }

    /// Display subtotal from the cached prices.
    #[must_use]
    pub fn subtotal_cents(&self) -> u64 {
        self.rows
            .iter()
            .map(|row| row.unit_price_cents.saturating_mul(u64::from(row.quantity)))
            .fold(0, u64::saturating_add)
    }

    /// The payload sent to `POST /checkout`: names and quantities only.
    #[must_use]
    pub fn checkout_items(&self) -> Vec<CartItemInput> {
        self.rows
            .iter()
            .map(|row| CartItemInput::new(row.name.clone(), row.quantity))
            .collect()
    }
}
