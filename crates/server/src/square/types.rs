//! Wire types for the Square Orders and Payments REST APIs.
//!
//! Only the fields the checkout sends or reads are modelled. Unknown response
//! fields are ignored.

use orderline_core::ScheduleType;
use serde::{Deserialize, Serialize};

// =============================================================================
// Money Types
// =============================================================================

/// Amount in minor units with currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the smallest currency unit.
    pub amount: u64,
    /// ISO 4217 currency code.
    pub currency: String,
}

// =============================================================================
// Order Types
// =============================================================================

/// `POST /orders` body.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest {
    pub idempotency_key: String,
    pub order: Order,
}

/// An order as submitted for creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub location_id: String,
    pub line_items: Vec<OrderLineItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub taxes: Vec<OrderLineItemTax>,
    pub fulfillments: Vec<Fulfillment>,
}

/// One line item. Quantity is a decimal string on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLineItem {
    pub name: String,
    pub quantity: String,
    pub base_price_money: Money,
}

/// Order-scoped tax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLineItemTax {
    pub uid: String,
    pub name: String,
    pub percentage: String,
    pub scope: TaxScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxScope {
    Order,
}

/// A fulfillment block. Exactly one of the details fields is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fulfillment {
    #[serde(rename = "type")]
    pub fulfillment_type: FulfillmentType,
    pub state: FulfillmentState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_details: Option<PickupDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_details: Option<DeliveryDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentType {
    Pickup,
    Delivery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentState {
    Proposed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickupDetails {
    pub recipient: Recipient,
    pub schedule_type: ScheduleType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryDetails {
    pub recipient: Recipient,
    pub schedule_type: ScheduleType,
}

/// Who receives the fulfillment. Delivery recipients carry the address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    pub display_name: String,
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

/// Postal address in Square's field naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub address_line_1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub administrative_district_level_1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    pub country: String,
}

/// `POST /orders` and `PUT /orders/{id}` response.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderResponse {
    #[serde(default)]
    pub order: Option<CreatedOrder>,
    #[serde(default)]
    pub errors: Vec<ApiError>,
}

/// The parts of a created order the checkout needs.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedOrder {
    pub id: String,
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(default)]
    pub total_money: Option<Money>,
}

/// `PUT /orders/{id}` body used to cancel an order.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateOrderRequest {
    pub idempotency_key: String,
    pub order: OrderStateUpdate,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderStateUpdate {
    pub location_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    pub state: OrderState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    Canceled,
}

// =============================================================================
// Payment Types
// =============================================================================

/// `POST /payments` body.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePaymentRequest {
    pub idempotency_key: String,
    pub source_id: String,
    pub location_id: String,
    pub amount_money: Money,
    pub order_id: String,
    pub autocomplete: bool,
}

/// `POST /payments` response.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentResponse {
    #[serde(default)]
    pub payment: Option<Payment>,
    #[serde(default)]
    pub errors: Vec<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Payment {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}

// =============================================================================
// Errors
// =============================================================================

/// One entry of the `errors` array in a failed response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
}

/// Body of any non-success response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<ApiError>,
}
