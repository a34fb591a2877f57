//! Checkout error taxonomy.
//!
//! Every way a checkout can fail maps onto exactly one variant. Validation
//! variants are always produced before any remote call is made.

use thiserror::Error;

/// Why a checkout attempt did not produce a paid order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// The request body does not have the expected shape.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// A cart line names an item that is not on the menu.
    #[error("Unknown item: {0}")]
    UnknownItem(String),

    /// A cart line has a quantity that is not a positive integer.
    #[error("Invalid quantity for {0}")]
    InvalidQuantity(String),

    /// Delivery was requested without an address.
    #[error("A delivery address is required for delivery orders")]
    MissingDeliveryAddress,

    /// The commerce platform rejected the order.
    #[error("Order creation failed: {0}")]
    OrderCreationFailed(String),

    /// The order was created but the payment was not captured.
    #[error("Payment failed: {0}")]
    PaymentCaptureFailed(String),

    /// The commerce platform could not be reached in time.
    #[error("Payment service unavailable: {0}")]
    ProviderUnavailable(String),

    /// Credentials or the price table are missing or incomplete.
    #[error("Checkout is not configured: {0}")]
    Configuration(String),
}

impl CheckoutError {
    /// Stable machine-readable name, used as a log field.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MalformedRequest(_) => "malformed_request",
            Self::UnknownItem(_) => "unknown_item",
            Self::InvalidQuantity(_) => "invalid_quantity",
            Self::MissingDeliveryAddress => "missing_delivery_address",
            Self::OrderCreationFailed(_) => "order_creation_failed",
            Self::PaymentCaptureFailed(_) => "payment_capture_failed",
            Self::ProviderUnavailable(_) => "provider_unavailable",
            Self::Configuration(_) => "configuration_error",
        }
    }

    /// Whether the failure was detected locally, before any remote call.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MalformedRequest(_)
                | Self::UnknownItem(_)
                | Self::InvalidQuantity(_)
                | Self::MissingDeliveryAddress
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            CheckoutError::UnknownItem("Unicorn Combo".to_string()).to_string(),
            "Unknown item: Unicorn Combo"
        );
        assert_eq!(
            CheckoutError::PaymentCaptureFailed("Card declined".to_string()).to_string(),
            "Payment failed: Card declined"
        );
    }

    #[test]
    fn test_validation_classification() {
        assert!(CheckoutError::MissingDeliveryAddress.is_validation());
        assert!(CheckoutError::InvalidQuantity("Soft Drink".to_string()).is_validation());
        assert!(!CheckoutError::OrderCreationFailed(String::new()).is_validation());
        assert!(!CheckoutError::ProviderUnavailable(String::new()).is_validation());
    }
}
