//! Inbound checkout request shape.

use orderline_core::{
    Address, CartItemInput, CheckoutError, ContactInfo, FulfillmentRequest,
    order::parse_pickup_time,
};
use serde::Deserialize;

/// `POST /checkout` body as sent by the storefront.
///
/// Every field is optional at the serde level so that a missing field is
/// reported with a specific message instead of a generic parse error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
    #[serde(default)]
    pub cart: Option<Vec<CartItemInput>>,
    #[serde(default)]
    pub contact: Option<ContactPayload>,
    #[serde(default)]
    pub pickup_time: Option<String>,
    /// `"pickup"` (default) or `"delivery"`.
    #[serde(default)]
    pub fulfillment: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub payment_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A request whose shape has been checked. Cart contents are still untrusted.
#[derive(Debug, Clone)]
pub struct ValidatedCheckout {
    pub items: Vec<CartItemInput>,
    pub contact: ContactInfo,
    pub fulfillment: FulfillmentRequest,
    pub payment_token: String,
}

impl CheckoutPayload {
    /// Check the request shape.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::MalformedRequest`] naming the first problem.
    pub fn validate(self) -> Result<ValidatedCheckout, CheckoutError> {
        let items = self
            .cart
            .ok_or_else(|| malformed("cart is required"))?;

        let contact = self
            .contact
            .ok_or_else(|| malformed("contact is required"))?;
        let contact = ContactInfo::parse(&contact.name, &contact.phone, contact.email.as_deref())?;

        let fulfillment = match self
            .fulfillment
            .as_deref()
            .map(str::trim)
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            None | Some("" | "pickup") => FulfillmentRequest::Pickup {
                pickup_at: self
                    .pickup_time
                    .as_deref()
                    .filter(|raw| !raw.trim().is_empty())
                    .map(parse_pickup_time)
                    .transpose()?,
            },
            Some("delivery") => FulfillmentRequest::Delivery {
                address: self.address,
            },
            Some(other) => {
                return Err(malformed(&format!(
                    "fulfillment must be \"pickup\" or \"delivery\", got \"{other}\""
                )));
            }
        };

        let payment_token = self
            .payment_token
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| malformed("paymentToken is required"))?;

        Ok(ValidatedCheckout {
            items,
            contact,
            fulfillment,
            payment_token,
        })
    }
}

fn malformed(message: &str) -> CheckoutError {
    CheckoutError::MalformedRequest(message.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use orderline_core::StructuredAddress;
    use serde_json::json;

    use super::*;

    fn parse(body: serde_json::Value) -> Result<ValidatedCheckout, CheckoutError> {
        serde_json::from_value::<CheckoutPayload>(body)
            .unwrap()
            .validate()
    }

    fn base() -> serde_json::Value {
        json!({
            "cart": [{"name": "Small Fries", "qty": 2}],
            "contact": {"name": "Ada", "phone": "555-0100"},
            "paymentToken": "cnon:ok"
        })
    }

    #[test]
    fn test_defaults_to_asap_pickup() {
        let checkout = parse(base()).unwrap();
        assert_eq!(checkout.fulfillment, FulfillmentRequest::Pickup { pickup_at: None });
        assert_eq!(checkout.payment_token, "cnon:ok");
        assert_eq!(checkout.items.len(), 1);
    }

    #[test]
    fn test_pickup_time_is_parsed() {
        let mut body = base();
        body["pickupTime"] = json!("2026-10-16T18:30:00Z");
        let checkout = parse(body).unwrap();
        assert!(matches!(
            checkout.fulfillment,
            FulfillmentRequest::Pickup { pickup_at: Some(_) }
        ));
    }

    #[test]
    fn test_bad_pickup_time_is_malformed() {
        let mut body = base();
        body["pickupTime"] = json!("tomorrow-ish");
        assert!(matches!(parse(body), Err(CheckoutError::MalformedRequest(_))));
    }

    #[test]
    fn test_structured_delivery_address() {
        let mut body = base();
        body["fulfillment"] = json!("Delivery");
        body["address"] = json!({"line1": "1 Side St", "postalCode": "94110"});
        let checkout = parse(body).unwrap();
        assert_eq!(
            checkout.fulfillment,
            FulfillmentRequest::Delivery {
                address: Some(Address::Structured(StructuredAddress {
                    line1: "1 Side St".to_string(),
                    postal_code: Some("94110".to_string()),
                    ..StructuredAddress::default()
                }))
            }
        );
    }

    #[test]
    fn test_delivery_without_address_passes_shape_check() {
        let mut body = base();
        body["fulfillment"] = json!("delivery");
        assert_eq!(
            parse(body).unwrap().fulfillment,
            FulfillmentRequest::Delivery { address: None }
        );
    }

    #[test]
    fn test_unknown_fulfillment_is_malformed() {
        let mut body = base();
        body["fulfillment"] = json!("drone");
        assert!(matches!(parse(body), Err(CheckoutError::MalformedRequest(_))));
    }

    #[test]
    fn test_missing_fields_are_malformed() {
        for field in ["cart", "contact", "paymentToken"] {
            let mut body = base();
            body.as_object_mut().unwrap().remove(field);
            let err = parse(body).unwrap_err();
            assert!(
                matches!(&err, CheckoutError::MalformedRequest(m) if m.contains(field)),
                "{field}: {err:?}"
            );
        }
    }

    #[test]
    fn test_blank_payment_token_is_malformed() {
        let mut body = base();
        body["paymentToken"] = json!("   ");
        assert!(matches!(parse(body), Err(CheckoutError::MalformedRequest(_))));
    }

    #[test]
    fn test_invalid_phone_is_malformed() {
        let mut body = base();
        body["contact"]["phone"] = json!("12");
        assert!(matches!(parse(body), Err(CheckoutError::MalformedRequest(_))));
    }
}
