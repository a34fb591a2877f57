//! Conversions from the order document to Square wire types.

use orderline_core::order::DeliveryAddress;
use orderline_core::{ContactInfo, OrderDraft, OrderFulfillment};

use super::types::{
    Address, DeliveryDetails, Fulfillment, FulfillmentState, FulfillmentType, Money, Order,
    OrderLineItem, OrderLineItemTax, PickupDetails, Recipient, TaxScope,
};

/// UID of the single order-level tax.
const SALES_TAX_UID: &str = "sales-tax";

/// Build the wire order for `location_id`.
pub fn convert_order(draft: &OrderDraft, location_id: &str) -> Order {
    let currency = draft.currency.code();

    let line_items = draft
        .lines
        .iter()
        .map(|line| OrderLineItem {
            name: line.name.clone(),
            quantity: line.quantity.to_string(),
            base_price_money: Money {
                amount: line.unit_price_cents,
                currency: currency.to_string(),
            },
        })
        .collect();

    let taxes = draft
        .tax
        .iter()
        .map(|tax| OrderLineItemTax {
            uid: SALES_TAX_UID.to_string(),
            name: tax.name.clone(),
            percentage: tax.percentage.to_string(),
            scope: TaxScope::Order,
        })
        .collect();

    Order {
        location_id: location_id.to_string(),
        line_items,
        taxes,
        fulfillments: vec![convert_fulfillment(&draft.fulfillment)],
    }
}

fn convert_fulfillment(fulfillment: &OrderFulfillment) -> Fulfillment {
    match fulfillment {
        OrderFulfillment::Pickup {
            recipient,
            schedule_type,
            ..
        } => Fulfillment {
            fulfillment_type: FulfillmentType::Pickup,
            state: FulfillmentState::Proposed,
            pickup_details: Some(PickupDetails {
                recipient: convert_recipient(recipient, None),
                schedule_type: *schedule_type,
                pickup_at: fulfillment.pickup_at_rfc3339(),
            }),
            delivery_details: None,
        },
        OrderFulfillment::Delivery {
            recipient,
            schedule_type,
            address,
        } => Fulfillment {
            fulfillment_type: FulfillmentType::Delivery,
            state: FulfillmentState::Proposed,
            pickup_details: None,
            delivery_details: Some(DeliveryDetails {
                recipient: convert_recipient(recipient, Some(address)),
                schedule_type: *schedule_type,
            }),
        },
    }
}

fn convert_recipient(contact: &ContactInfo, address: Option<&DeliveryAddress>) -> Recipient {
    Recipient {
        display_name: contact.name.clone(),
        phone_number: contact.phone.to_string(),
        email_address: contact.email.as_ref().map(ToString::to_string),
        address: address.map(|a| Address {
            address_line_1: a.line1.clone(),
            locality: a.locality.clone(),
            administrative_district_level_1: a.region.clone(),
            postal_code: a.postal_code.clone(),
            country: a.country.clone(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use orderline_core::{
        Address as ClientAddress, CheckoutLine, CurrencyCode, FulfillmentRequest, PricingConfig,
        assemble_order, order::parse_pickup_time,
    };
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;

    fn draft(fulfillment: &FulfillmentRequest) -> OrderDraft {
        let lines = vec![CheckoutLine {
            name: "Small Fries".to_string(),
            quantity: 2,
            unit_price_cents: 299,
        }];
        let contact = ContactInfo::parse("Ada", "555-0100", Some("ada@example.com")).unwrap();
        let config = PricingConfig {
            tax_rate_percent: Decimal::from(8),
            delivery_fee_cents: 300,
            currency: CurrencyCode::USD,
        };
        assemble_order(&lines, &contact, fulfillment, &config).unwrap()
    }

    #[test]
    fn test_scheduled_pickup_wire_format() {
        let at = parse_pickup_time("2026-10-16T18:30:00Z").unwrap();
        let order = convert_order(
            &draft(&FulfillmentRequest::Pickup {
                pickup_at: Some(at),
            }),
            "L123",
        );

        assert_eq!(
            serde_json::to_value(&order).unwrap(),
            json!({
                "location_id": "L123",
                "line_items": [{
                    "name": "Small Fries",
                    "quantity": "2",
                    "base_price_money": {"amount": 299, "currency": "USD"}
                }],
                "taxes": [{
                    "uid": "sales-tax",
                    "name": "Sales Tax",
                    "percentage": "8",
                    "scope": "ORDER"
                }],
                "fulfillments": [{
                    "type": "PICKUP",
                    "state": "PROPOSED",
                    "pickup_details": {
                        "recipient": {
                            "display_name": "Ada",
                            "phone_number": "555-0100",
                            "email_address": "ada@example.com"
                        },
                        "schedule_type": "SCHEDULED",
                        "pickup_at": "2026-10-16T18:30:00Z"
                    }
                }]
            })
        );
    }

    #[test]
    fn test_delivery_wire_format() {
        let order = convert_order(
            &draft(&FulfillmentRequest::Delivery {
                address: Some(ClientAddress::FreeText("123 Main St".to_string())),
            }),
            "L123",
        );
        let value = serde_json::to_value(&order).unwrap();

        assert_eq!(
            value["line_items"][1],
            json!({
                "name": "Delivery Fee",
                "quantity": "1",
                "base_price_money": {"amount": 300, "currency": "USD"}
            })
        );
        let fulfillment = &value["fulfillments"][0];
        assert_eq!(fulfillment["type"], "DELIVERY");
        assert!(fulfillment.get("pickup_details").is_none());
        assert_eq!(fulfillment["delivery_details"]["schedule_type"], "ASAP");
        assert_eq!(
            fulfillment["delivery_details"]["recipient"]["address"],
            json!({"address_line_1": "123 Main St", "country": "US"})
        );
    }
}
