//! Offline quote: sanitize and total a cart the way `/checkout` does.

use std::path::{Path, PathBuf};

use orderline_core::{
    CartItemInput, CheckoutError, CheckoutLine, FulfillmentKind, PriceTable, PricingConfig,
    Totals, compute_totals, sanitize,
};
use orderline_server::config::ServerConfig;
use orderline_server::prices::load_price_file;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use super::{CommandError, write_json};

/// Overrides for a quote. Unset values come from the server configuration.
#[derive(Debug, Default)]
pub struct QuoteOptions {
    pub tax_rate: Option<Decimal>,
    pub delivery_fee: Option<u64>,
    pub delivery: bool,
    pub prices: Option<PathBuf>,
}

/// A priced cart.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub fulfillment: FulfillmentKind,
    pub lines: Vec<CheckoutLine>,
    pub totals: Totals,
}

/// Quote the cart in `cart_file` and print it as JSON.
///
/// # Errors
///
/// Returns an error if a file cannot be read, the configuration is invalid or
/// the cart does not sanitize.
pub async fn run(cart_file: &Path, options: QuoteOptions) -> Result<(), CommandError> {
    let base = ServerConfig::from_env()?.pricing;
    let config = PricingConfig {
        tax_rate_percent: options.tax_rate.unwrap_or(base.tax_rate_percent),
        delivery_fee_cents: options.delivery_fee.unwrap_or(base.delivery_fee_cents),
        currency: base.currency,
    };
    if config.tax_rate_percent.is_sign_negative() {
        return Err(CommandError::NegativeTaxRate);
    }

    let table = match &options.prices {
        Some(path) => load_price_file(path).await?,
        None => PriceTable::default_menu(),
    };

    let cart = tokio::fs::read_to_string(cart_file)
        .await
        .map_err(|source| CommandError::CartFile {
            path: cart_file.to_path_buf(),
            source,
        })?;
    let items: Vec<CartItemInput> = serde_json::from_str(&cart).map_err(CommandError::Cart)?;

    let kind = if options.delivery {
        FulfillmentKind::Delivery
    } else {
        FulfillmentKind::Pickup
    };
    let quote = quote(&items, &table, kind, &config)?;
    info!(total_cents = quote.totals.total_cents, "Cart quoted");

    write_json(&quote)
}

/// Price `items` against `table`.
///
/// # Errors
///
/// Returns the same error `/checkout` would for this cart.
pub fn quote(
    items: &[CartItemInput],
    table: &PriceTable,
    fulfillment: FulfillmentKind,
    config: &PricingConfig,
) -> Result<Quote, CheckoutError> {
    let lines = sanitize(items, table)?;
    let totals = compute_totals(&lines, fulfillment, config)?;
    Ok(Quote {
        fulfillment,
        lines,
        totals,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> PricingConfig {
        PricingConfig {
            tax_rate_percent: Decimal::from(8),
            delivery_fee_cents: 300,
            ..PricingConfig::default()
        }
    }

    #[test]
    fn test_pickup_quote() {
        let quote = quote(
            &[CartItemInput::new("Small Fries", 2)],
            &PriceTable::default_menu(),
            FulfillmentKind::Pickup,
            &config(),
        )
        .unwrap();

        assert_eq!(quote.lines[0].unit_price_cents, 299);
        assert_eq!(quote.totals.subtotal_cents, 598);
        assert_eq!(quote.totals.tax_cents, 48);
        assert_eq!(quote.totals.total_cents, 646);
    }

    #[test]
    fn test_delivery_quote() {
        let quote = quote(
            &[CartItemInput::new("Small Fries", 2)],
            &PriceTable::default_menu(),
            FulfillmentKind::Delivery,
            &config(),
        )
        .unwrap();

        assert_eq!(quote.totals.delivery_fee_cents, 300);
        assert_eq!(quote.totals.tax_cents, 72);
        assert_eq!(quote.totals.total_cents, 970);
    }

    #[test]
    fn test_unknown_item() {
        let result = quote(
            &[CartItemInput::new("Unicorn Combo", 1)],
            &PriceTable::default_menu(),
            FulfillmentKind::Pickup,
            &config(),
        );
        assert_eq!(
            result.unwrap_err(),
            CheckoutError::UnknownItem("Unicorn Combo".to_string())
        );
    }

    #[tokio::test]
    async fn test_run_rejects_negative_tax_rate() {
        let options = QuoteOptions {
            tax_rate: Some(Decimal::from(-1)),
            ..QuoteOptions::default()
        };
        let result = run(Path::new("cart.json"), options).await;
        assert!(matches!(result, Err(CommandError::NegativeTaxRate)));
    }

    #[tokio::test]
    async fn test_run_reports_unreadable_cart() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(&dir.path().join("cart.json"), QuoteOptions::default()).await;
        assert!(matches!(result, Err(CommandError::CartFile { .. })));
    }

    #[tokio::test]
    async fn test_run_reports_malformed_cart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        std::fs::write(&path, r#"{"name": "Small Fries"}"#).unwrap();
        let result = run(&path, QuoteOptions::default()).await;
        assert!(matches!(result, Err(CommandError::Cart(_))));
    }

    #[test]
    fn test_quote_serializes_camel_case() {
        let quote = quote(
            &[CartItemInput::new("Lemonade", 1)],
            &PriceTable::default_menu(),
            FulfillmentKind::Pickup,
            &PricingConfig::default(),
        )
        .unwrap();
        let value = serde_json::to_value(&quote).unwrap();
        assert_eq!(value["fulfillment"], "pickup");
        assert_eq!(value["lines"][0]["unitPriceCents"], 249);
        assert_eq!(value["totals"]["totalCents"], 249);
    }
}
