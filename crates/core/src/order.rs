//! Order assembly.
//!
//! Turns sanitized lines, contact details and the requested fulfillment into
//! an [`OrderDraft`]: the platform-neutral order document that the server
//! converts to the commerce platform's wire format.

use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CheckoutError;
use crate::sanitize::CheckoutLine;
use crate::totals::PricingConfig;
use crate::types::{CurrencyCode, Email, PhoneNumber};

/// Line item name used for the delivery fee.
pub const DELIVERY_FEE_LINE: &str = "Delivery Fee";

/// Name of the tax declared on orders when tax is enabled.
pub const SALES_TAX_NAME: &str = "Sales Tax";

/// Country assumed when an address does not name one.
pub const DEFAULT_COUNTRY: &str = "US";

/// How the customer receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentKind {
    /// Collected at the counter.
    #[default]
    Pickup,
    /// Brought to the customer's address.
    Delivery,
}

/// Who the order is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactInfo {
    /// Display name, never blank.
    pub name: String,
    /// Callback number.
    pub phone: PhoneNumber,
    /// Receipt address, if given.
    pub email: Option<Email>,
}

impl ContactInfo {
    /// Validate raw contact fields. A blank email counts as no email.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::MalformedRequest`] if the name is blank or the
    /// phone number or email is invalid.
    pub fn parse(name: &str, phone: &str, email: Option<&str>) -> Result<Self, CheckoutError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CheckoutError::MalformedRequest(
                "contact name is required".to_string(),
            ));
        }

        let phone = PhoneNumber::parse(phone)
            .map_err(|e| CheckoutError::MalformedRequest(format!("contact phone: {e}")))?;

        let email = match email.map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                Email::parse(raw)
                    .map_err(|e| CheckoutError::MalformedRequest(format!("contact email: {e}")))?,
            ),
        };

        Ok(Self {
            name: name.to_string(),
            phone,
            email,
        })
    }
}

/// A structured street address as submitted by the client.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredAddress {
    /// Street line, required.
    #[serde(default)]
    pub line1: String,
    /// City.
    #[serde(default)]
    pub locality: Option<String>,
    /// State or province.
    #[serde(default)]
    pub region: Option<String>,
    /// ZIP or postal code.
    #[serde(default)]
    pub postal_code: Option<String>,
    /// Two-letter country code, defaults to [`DEFAULT_COUNTRY`].
    #[serde(default)]
    pub country: Option<String>,
}

/// A delivery address: free text or structured fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Address {
    /// A single line typed by the customer.
    FreeText(String),
    /// Separate address fields.
    Structured(StructuredAddress),
}

impl Address {
    /// Normalize into a [`DeliveryAddress`], or `None` if there is no street
    /// line to deliver to.
    #[must_use]
    pub fn normalize(&self) -> Option<DeliveryAddress> {
        match self {
            Self::FreeText(text) => non_blank(Some(text)).map(|line1| DeliveryAddress {
                line1,
                locality: None,
                region: None,
                postal_code: None,
                country: DEFAULT_COUNTRY.to_string(),
            }),
            Self::Structured(address) => {
                non_blank(Some(&address.line1)).map(|line1| DeliveryAddress {
                    line1,
                    locality: non_blank(address.locality.as_ref()),
                    region: non_blank(address.region.as_ref()),
                    postal_code: non_blank(address.postal_code.as_ref()),
                    country: non_blank(address.country.as_ref())
                        .map_or_else(|| DEFAULT_COUNTRY.to_string(), |c| c.to_ascii_uppercase()),
                })
            }
        }
    }
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// The fulfillment the customer asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FulfillmentRequest {
    /// Pickup, as soon as possible or at a given time.
    Pickup {
        /// Requested pickup time; `None` means ASAP.
        pickup_at: Option<DateTime<FixedOffset>>,
    },
    /// Delivery to an address.
    Delivery {
        /// Where to deliver. Required; `None` fails assembly.
        address: Option<Address>,
    },
}

impl FulfillmentRequest {
    /// The fulfillment kind, for totals.
    #[must_use]
    pub const fn kind(&self) -> FulfillmentKind {
        match self {
            Self::Pickup { .. } => FulfillmentKind::Pickup,
            Self::Delivery { .. } => FulfillmentKind::Delivery,
        }
    }
}

/// Parse a client-supplied pickup time.
///
/// RFC 3339 timestamps are used as given. A timestamp without an offset is
/// taken to be UTC.
///
/// # Errors
///
/// Returns [`CheckoutError::MalformedRequest`] if the value is not an ISO-8601
/// date-time.
pub fn parse_pickup_time(raw: &str) -> Result<DateTime<FixedOffset>, CheckoutError> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at);
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc().fixed_offset())
        .ok_or_else(|| {
            CheckoutError::MalformedRequest(format!("pickupTime is not an ISO-8601 time: {raw}"))
        })
}

/// Whether a fulfillment happens as soon as possible or at a set time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleType {
    /// As soon as possible.
    Asap,
    /// At a specific time.
    Scheduled,
}

/// A normalized delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    pub line1: String,
    pub locality: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
}

/// Whether an order line is food or a fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Item,
    Fee,
}

/// One priced line of an order document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub name: String,
    pub quantity: u32,
    pub unit_price_cents: u64,
    pub kind: LineKind,
}

/// An order-level tax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxDeclaration {
    pub name: String,
    pub percentage: Decimal,
}

/// The single fulfillment block of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OrderFulfillment {
    Pickup {
        recipient: ContactInfo,
        schedule_type: ScheduleType,
        pickup_at: Option<DateTime<FixedOffset>>,
    },
    Delivery {
        recipient: ContactInfo,
        schedule_type: ScheduleType,
        address: DeliveryAddress,
    },
}

impl OrderFulfillment {
    /// The recipient of either fulfillment.
    #[must_use]
    pub const fn recipient(&self) -> &ContactInfo {
        match self {
            Self::Pickup { recipient, .. } | Self::Delivery { recipient, .. } => recipient,
        }
    }

    /// Pickup time formatted for the wire, if scheduled.
    #[must_use]
    pub fn pickup_at_rfc3339(&self) -> Option<String> {
        match self {
            Self::Pickup {
                pickup_at: Some(at),
                ..
            } => Some(if at.offset().local_minus_utc() == 0 {
                at.with_timezone(&Utc)
                    .to_rfc3339_opts(SecondsFormat::AutoSi, true)
            } else {
                at.to_rfc3339_opts(SecondsFormat::AutoSi, false)
            }),
            _ => None,
        }
    }
}

/// A complete, fulfillment-typed order ready to submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    /// Menu lines followed by the delivery fee line, if any.
    pub lines: Vec<OrderLine>,
    /// Present when tax is enabled.
    pub tax: Option<TaxDeclaration>,
    /// Exactly one fulfillment.
    pub fulfillment: OrderFulfillment,
    /// Currency of every amount in the document.
    pub currency: CurrencyCode,
}

/// Build the order document.
///
/// Pickup is `Scheduled` when a time was supplied and `Asap` otherwise.
/// Delivery is always `Asap`.
///
/// # Errors
///
/// Returns [`CheckoutError::MissingDeliveryAddress`] for a delivery without a
/// usable address.
pub fn assemble_order(
    lines: &[CheckoutLine],
    contact: &ContactInfo,
    fulfillment: &FulfillmentRequest,
    config: &PricingConfig,
) -> Result<OrderDraft, CheckoutError> {
    let block = match fulfillment {
        FulfillmentRequest::Pickup { pickup_at } => OrderFulfillment::Pickup {
            recipient: contact.clone(),
            schedule_type: if pickup_at.is_some() {
                ScheduleType::Scheduled
            } else {
                ScheduleType::Asap
            },
            pickup_at: *pickup_at,
        },
        FulfillmentRequest::Delivery { address } => OrderFulfillment::Delivery {
            recipient: contact.clone(),
            schedule_type: ScheduleType::Asap,
            address: address
                .as_ref()
                .and_then(Address::normalize)
                .ok_or(CheckoutError::MissingDeliveryAddress)?,
        },
    };

    let mut order_lines: Vec<OrderLine> = lines
        .iter()
        .map(|line| OrderLine {
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price_cents: line.unit_price_cents,
            kind: LineKind::Item,
        })
        .collect();

    let fee = config.delivery_fee_for(fulfillment.kind());
    if fee > 0 {
        order_lines.push(OrderLine {
            name: DELIVERY_FEE_LINE.to_string(),
            quantity: 1,
            unit_price_cents: fee,
            kind: LineKind::Fee,
        });
    }

    let tax = config.taxes_enabled().then(|| TaxDeclaration {
        name: SALES_TAX_NAME.to_string(),
        percentage: config.tax_rate_percent.normalize(),
    });

    Ok(OrderDraft {
        lines: order_lines,
        tax,
        fulfillment: block,
        currency: config.currency,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn contact() -> ContactInfo {
        ContactInfo::parse("Ada", "555-0100", Some("ada@example.com")).unwrap()
    }

    fn fries() -> Vec<CheckoutLine> {
        vec![CheckoutLine {
            name: "Small Fries".to_string(),
            quantity: 2,
            unit_price_cents: 299,
        }]
    }

    fn config() -> PricingConfig {
        PricingConfig {
            tax_rate_percent: Decimal::from(8),
            delivery_fee_cents: 300,
            currency: CurrencyCode::USD,
        }
    }

    #[test]
    fn test_pickup_asap() {
        let order = assemble_order(
            &fries(),
            &contact(),
            &FulfillmentRequest::Pickup { pickup_at: None },
            &config(),
        )
        .unwrap();

        assert_eq!(order.lines.len(), 1);
        assert_eq!(
            order.tax,
            Some(TaxDeclaration {
                name: "Sales Tax".to_string(),
                percentage: Decimal::from(8),
            })
        );
        assert!(matches!(
            order.fulfillment,
            OrderFulfillment::Pickup {
                schedule_type: ScheduleType::Asap,
                pickup_at: None,
                ..
            }
        ));
        assert_eq!(order.fulfillment.recipient().name, "Ada");
    }

    #[test]
    fn test_pickup_scheduled() {
        let at = parse_pickup_time("2026-10-16T18:30:00Z").unwrap();
        let order = assemble_order(
            &fries(),
            &contact(),
            &FulfillmentRequest::Pickup {
                pickup_at: Some(at),
            },
            &config(),
        )
        .unwrap();

        assert!(matches!(
            order.fulfillment,
            OrderFulfillment::Pickup {
                schedule_type: ScheduleType::Scheduled,
                pickup_at: Some(_),
                ..
            }
        ));
        assert_eq!(
            order.fulfillment.pickup_at_rfc3339().as_deref(),
            Some("2026-10-16T18:30:00Z")
        );
    }

    #[test]
    fn test_delivery_free_text_address() {
        let order = assemble_order(
            &fries(),
            &contact(),
            &FulfillmentRequest::Delivery {
                address: Some(Address::FreeText("123 Main St".to_string())),
            },
            &config(),
        )
        .unwrap();

        assert_eq!(order.lines.len(), 2);
        let fee = &order.lines[1];
        assert_eq!(fee.name, "Delivery Fee");
        assert_eq!(fee.unit_price_cents, 300);
        assert_eq!(fee.quantity, 1);
        assert_eq!(fee.kind, LineKind::Fee);

        match order.fulfillment {
            OrderFulfillment::Delivery {
                schedule_type,
                address,
                ..
            } => {
                assert_eq!(schedule_type, ScheduleType::Asap);
                assert_eq!(address.line1, "123 Main St");
                assert_eq!(address.country, "US");
                assert_eq!(address.locality, None);
            }
            OrderFulfillment::Pickup { .. } => panic!("expected delivery"),
        }
    }

    #[test]
    fn test_delivery_structured_address_defaults_country() {
        let address = Address::Structured(StructuredAddress {
            line1: "1 Harbor Way".to_string(),
            locality: Some("Oakland".to_string()),
            region: Some("CA".to_string()),
            postal_code: Some("94607".to_string()),
            country: None,
        });
        let normalized = address.normalize().unwrap();
        assert_eq!(normalized.country, "US");
        assert_eq!(normalized.locality.as_deref(), Some("Oakland"));

        let address = Address::Structured(StructuredAddress {
            line1: "1 Front St".to_string(),
            country: Some("ca".to_string()),
            ..StructuredAddress::default()
        });
        assert_eq!(address.normalize().unwrap().country, "CA");
    }

    #[test]
    fn test_delivery_without_address() {
        for address in [
            None,
            Some(Address::FreeText("   ".to_string())),
            Some(Address::Structured(StructuredAddress::default())),
        ] {
            assert_eq!(
                assemble_order(
                    &fries(),
                    &contact(),
                    &FulfillmentRequest::Delivery { address },
                    &config(),
                ),
                Err(CheckoutError::MissingDeliveryAddress)
            );
        }
    }

    #[test]
    fn test_no_tax_declaration_when_rate_is_zero() {
        let config = PricingConfig::default();
        let order = assemble_order(
            &fries(),
            &contact(),
            &FulfillmentRequest::Delivery {
                address: Some(Address::FreeText("123 Main St".to_string())),
            },
            &config,
        )
        .unwrap();
        assert!(order.tax.is_none());
        // No fee configured, so no fee line either.
        assert_eq!(order.lines.len(), 1);
    }

    #[test]
    fn test_address_deserializes_either_shape() {
        let text: Address = serde_json::from_str("\"123 Main St\"").unwrap();
        assert_eq!(text, Address::FreeText("123 Main St".to_string()));

        let structured: Address =
            serde_json::from_str(r#"{"line1": "9 Elm", "postalCode": "02139"}"#).unwrap();
        assert!(matches!(structured, Address::Structured(ref a) if a.postal_code.as_deref() == Some("02139")));
    }

    #[test]
    fn test_contact_validation() {
        assert!(ContactInfo::parse("", "555-0100", None).is_err());
        assert!(ContactInfo::parse("Ada", "12", None).is_err());
        assert!(ContactInfo::parse("Ada", "555-0100", Some("nope")).is_err());

        let contact = ContactInfo::parse(" Ada ", "555-0100", Some("  ")).unwrap();
        assert_eq!(contact.name, "Ada");
        assert!(contact.email.is_none());
    }

    #[test]
    fn test_parse_pickup_time_formats() {
        assert!(parse_pickup_time("2026-10-16T18:30:00-07:00").is_ok());
        assert!(parse_pickup_time("2026-10-16T18:30:00.000Z").is_ok());
        let naive = parse_pickup_time("2026-10-16T18:30").unwrap();
        assert_eq!(naive.offset().local_minus_utc(), 0);
        assert!(matches!(
            parse_pickup_time("tomorrow at six"),
            Err(CheckoutError::MalformedRequest(_))
        ));
    }
}
