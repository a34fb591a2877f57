//! Cart sanitization.
//!
//! Re-derives trusted data from a client-submitted cart: each line keeps only
//! the item name and quantity the client sent, and the unit price is looked up
//! in the [`PriceTable`]. Any price the client included is ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CheckoutError;
use crate::pricing::PriceTable;

/// Largest quantity accepted for a single cart line.
pub const MAX_LINE_QUANTITY: u32 = 9_999;

/// One line of a cart as submitted by the client.
///
/// `qty` is kept as raw JSON because browsers send numbers, numeric strings
/// and occasionally nothing at all. Unknown fields (such as a client-side
/// unit price) are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CartItemInput {
    /// Menu item name.
    pub name: String,
    /// Requested quantity, loosely typed.
    #[serde(default)]
    pub qty: Option<Value>,
}

impl CartItemInput {
    /// Convenience constructor for an integer quantity.
    #[must_use]
    pub fn new(name: impl Into<String>, qty: u32) -> Self {
        Self {
            name: name.into(),
            qty: Some(Value::from(qty)),
        }
    }
}

/// A cart line after sanitization, priced by the price authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLine {
    /// Menu item name, exactly as it appears in the price table.
    pub name: String,
    /// Positive quantity.
    pub quantity: u32,
    /// Unit price from the price authority.
    pub unit_price_cents: u64,
}

impl CheckoutLine {
    /// `unit_price_cents × quantity`, or `None` on overflow.
    #[must_use]
    pub fn line_total_cents(&self) -> Option<u64> {
        self.unit_price_cents.checked_mul(u64::from(self.quantity))
    }
}

/// Validate a cart against `prices` and attach trusted unit prices.
///
/// Lines are checked in order and the first bad line rejects the whole cart.
///
/// # Errors
///
/// - [`CheckoutError::MalformedRequest`] if the cart is empty.
/// - [`CheckoutError::UnknownItem`] if a name is not in `prices`.
/// - [`CheckoutError::InvalidQuantity`] if a quantity is not a positive
///   integer no larger than [`MAX_LINE_QUANTITY`].
pub fn sanitize(
    items: &[CartItemInput],
    prices: &PriceTable,
) -> Result<Vec<CheckoutLine>, CheckoutError> {
    if items.is_empty() {
        return Err(CheckoutError::MalformedRequest(
            "cart must contain at least one item".to_string(),
        ));
    }

    items
        .iter()
        .map(|item| {
            let name = item.name.trim();
            let unit_price_cents = prices
                .get(name)
                .ok_or_else(|| CheckoutError::UnknownItem(name.to_string()))?;
            let quantity = item
                .qty
                .as_ref()
                .and_then(strict_quantity)
                .ok_or_else(|| CheckoutError::InvalidQuantity(name.to_string()))?;

            Ok(CheckoutLine {
                name: name.to_string(),
                quantity,
                unit_price_cents,
            })
        })
        .collect()
}

/// Interpret a loosely-typed JSON quantity, accepting only whole numbers in
/// `1..=MAX_LINE_QUANTITY`.
///
/// Integers, floats without a fractional part, and strings holding either are
/// accepted. Everything else is rejected; there is no defaulting here.
#[must_use]
pub fn strict_quantity(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().and_then(whole_number)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_number))
        }
        _ => None,
    }
    .filter(|n| (1..=u64::from(MAX_LINE_QUANTITY)).contains(n))
    .and_then(|n| u32::try_from(n).ok())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // range checked first
fn whole_number(f: f64) -> Option<u64> {
    (f.is_finite() && f.fract() == 0.0 && f >= 1.0 && f <= f64::from(MAX_LINE_QUANTITY))
        .then_some(f as u64)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn menu() -> PriceTable {
        PriceTable::from_entries([("Small Fries", 299), ("Milkshake", 549)])
    }

    fn line(name: &str, qty: Value) -> CartItemInput {
        CartItemInput {
            name: name.to_string(),
            qty: Some(qty),
        }
    }

    #[test]
    fn test_sanitize_uses_authority_prices() {
        // The client claims fries cost a cent; the price table says otherwise.
        let cart: Vec<CartItemInput> = serde_json::from_value(json!([
            {"name": "Small Fries", "qty": 2, "unitPriceCents": 1},
            {"name": "Milkshake", "qty": 1}
        ]))
        .unwrap();

        let lines = sanitize(&cart, &menu()).unwrap();
        assert_eq!(
            lines,
            vec![
                CheckoutLine {
                    name: "Small Fries".to_string(),
                    quantity: 2,
                    unit_price_cents: 299,
                },
                CheckoutLine {
                    name: "Milkshake".to_string(),
                    quantity: 1,
                    unit_price_cents: 549,
                },
            ]
        );
    }

    #[test]
    fn test_sanitize_unknown_item() {
        let cart = vec![
            CartItemInput::new("Small Fries", 1),
            CartItemInput::new("Unicorn Combo", 1),
        ];
        assert_eq!(
            sanitize(&cart, &menu()),
            Err(CheckoutError::UnknownItem("Unicorn Combo".to_string()))
        );
    }

    #[test]
    fn test_sanitize_fails_fast_on_first_bad_line() {
        let cart = vec![
            line("Small Fries", json!(0)),
            CartItemInput::new("Unicorn Combo", 1),
        ];
        assert_eq!(
            sanitize(&cart, &menu()),
            Err(CheckoutError::InvalidQuantity("Small Fries".to_string()))
        );
    }

    #[test]
    fn test_sanitize_invalid_quantities() {
        for qty in [
            json!(0),
            json!(-1),
            json!(1.5),
            json!("two"),
            json!(null),
            json!(true),
            json!([1]),
            json!(10_000),
        ] {
            let cart = vec![line("Small Fries", qty.clone())];
            assert_eq!(
                sanitize(&cart, &menu()),
                Err(CheckoutError::InvalidQuantity("Small Fries".to_string())),
                "quantity {qty} should be rejected"
            );
        }
    }

    #[test]
    fn test_sanitize_missing_quantity() {
        let cart: Vec<CartItemInput> =
            serde_json::from_value(json!([{"name": "Small Fries"}])).unwrap();
        assert_eq!(
            sanitize(&cart, &menu()),
            Err(CheckoutError::InvalidQuantity("Small Fries".to_string()))
        );
    }

    #[test]
    fn test_strict_quantity_accepts_loose_whole_numbers() {
        assert_eq!(strict_quantity(&json!(3)), Some(3));
        assert_eq!(strict_quantity(&json!(3.0)), Some(3));
        assert_eq!(strict_quantity(&json!("3")), Some(3));
        assert_eq!(strict_quantity(&json!(" 4.0 ")), Some(4));
        assert_eq!(strict_quantity(&json!(9_999)), Some(9_999));
    }

    #[test]
    fn test_sanitize_empty_cart() {
        assert!(matches!(
            sanitize(&[], &menu()),
            Err(CheckoutError::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_sanitize_trims_names() {
        let lines = sanitize(&[CartItemInput::new("  Milkshake ", 1)], &menu()).unwrap();
        assert_eq!(lines[0].name, "Milkshake");
    }
}
