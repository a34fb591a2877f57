//! Square REST client for order creation and payment capture.
//!
//! # API Reference
//!
//! - Base URL: `https://connect.squareupsandbox.com/v2` (sandbox) or
//!   `https://connect.squareup.com/v2` (production)
//! - Authentication: `Authorization: Bearer <access token>`
//! - API Version: `Square-Version` header, see `SQUARE_API_VERSION`
//!
//! Every mutating call carries an idempotency key supplied by the caller.

mod conversions;
pub mod types;

pub use conversions::convert_order;

use std::sync::Arc;

use async_trait::async_trait;
use orderline_core::{IdempotencyKey, OrderDraft, PaymentId, RemoteOrderId};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::SecretString;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::checkout::{CommerceApi, CreatedOrder, PaymentRequest, RemoteError};
use crate::config::{SquareConfig, bearer};
use types::{
    ApiError, CreateOrderRequest, CreatePaymentRequest, ErrorResponse, Money, OrderResponse,
    OrderState, OrderStateUpdate, PaymentResponse, UpdateOrderRequest,
};

/// Payment statuses that mean the capture did not go through.
const FAILED_PAYMENT_STATUSES: [&str; 2] = ["FAILED", "CANCELED"];

/// Errors that can occur when talking to Square.
#[derive(Debug, Error)]
pub enum SquareError {
    /// Transport failure or timeout.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Square answered with an error status.
    #[error("API error: {status} - {}", summarize(.errors))]
    Api { status: u16, errors: Vec<ApiError> },

    /// Rate limited by Square.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The response body could not be understood.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A required credential is missing.
    #[error("Missing configuration: {0}")]
    NotConfigured(&'static str),
}

impl SquareError {
    /// First human-readable detail Square gave, if any.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Api { errors, .. } => errors.iter().find_map(|e| {
                e.detail
                    .clone()
                    .or_else(|| e.code.clone())
                    .filter(|d| !d.trim().is_empty())
            }),
            _ => None,
        }
    }
}

impl From<SquareError> for RemoteError {
    fn from(error: SquareError) -> Self {
        match error {
            SquareError::Api { status, .. } if status < 500 => {
                Self::Rejected(error.detail().unwrap_or_default())
            }
            SquareError::Api { .. } => Self::Indeterminate(error.detail().unwrap_or_default()),
            // Square turns the request away before processing it.
            SquareError::RateLimited(_) => Self::Rejected(error.to_string()),
            SquareError::NotConfigured(name) => Self::NotConfigured(format!("{name} is not set")),
            SquareError::Http(_) | SquareError::Parse(_) => Self::Unavailable(error.to_string()),
        }
    }
}

fn summarize(errors: &[ApiError]) -> String {
    if errors.is_empty() {
        return "no error details".to_string();
    }
    errors
        .iter()
        .map(|e| {
            format!(
                "{}: {}",
                e.code.as_deref().unwrap_or("UNKNOWN"),
                e.detail.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Square API client.
#[derive(Clone)]
pub struct SquareClient {
    inner: Arc<SquareClientInner>,
}

struct SquareClientInner {
    client: reqwest::Client,
    base_url: Url,
    location_id: Option<String>,
    has_token: bool,
}

impl SquareClient {
    /// Create a new Square client.
    ///
    /// Missing credentials are not an error here: calls fail with
    /// [`SquareError::NotConfigured`] until they are set.
    ///
    /// # Errors
    ///
    /// Returns error if a header value is invalid or the HTTP client fails to
    /// build.
    pub fn new(config: &SquareConfig) -> Result<Self, SquareError> {
        let mut headers = HeaderMap::new();

        if let Some(token) = &config.access_token {
            headers.insert(AUTHORIZATION, auth_header(token)?);
        }
        headers.insert(
            "Square-Version",
            HeaderValue::from_str(&config.api_version)
                .map_err(|e| SquareError::Parse(format!("Invalid API version: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(SquareClientInner {
                client,
                base_url: config.base_url.clone(),
                location_id: config.location_id.clone(),
                has_token: config.access_token.is_some(),
            }),
        })
    }

    fn location_id(&self) -> Result<&str, SquareError> {
        if !self.inner.has_token {
            return Err(SquareError::NotConfigured("SQUARE_ACCESS_TOKEN"));
        }
        self.inner
            .location_id
            .as_deref()
            .ok_or(SquareError::NotConfigured("SQUARE_LOCATION_ID"))
    }

    fn url(&self, path: &str) -> Result<Url, SquareError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| SquareError::Parse(format!("Invalid request path {path}: {e}")))
    }

    /// Create an order.
    ///
    /// # Errors
    ///
    /// Returns error if credentials are missing, the request fails or Square
    /// rejects the order.
    #[instrument(skip(self, draft), fields(lines = draft.lines.len()))]
    pub async fn create_order(
        &self,
        draft: &OrderDraft,
        idempotency_key: &IdempotencyKey,
    ) -> Result<types::CreatedOrder, SquareError> {
        let body = CreateOrderRequest {
            idempotency_key: idempotency_key.to_string(),
            order: convert_order(draft, self.location_id()?),
        };
        let response = self
            .inner
            .client
            .post(self.url("orders")?)
            .json(&body)
            .send()
            .await?;
        let parsed: OrderResponse = handle_response(response).await?;

        let order = expect_entity(parsed.order, parsed.errors, "order")?;
        debug!(order_id = %order.id, "Square order created");
        Ok(order)
    }

    /// Capture a payment against an order.
    ///
    /// # Errors
    ///
    /// Returns error if credentials are missing, the request fails or the
    /// payment is declined.
    #[instrument(skip(self, payment), fields(order_id = %payment.order_id, amount = payment.amount.amount_cents))]
    pub async fn create_payment(
        &self,
        payment: &PaymentRequest,
        idempotency_key: &IdempotencyKey,
    ) -> Result<types::Payment, SquareError> {
        let body = CreatePaymentRequest {
            idempotency_key: idempotency_key.to_string(),
            source_id: payment.source_token.clone(),
            location_id: self.location_id()?.to_string(),
            amount_money: Money {
                amount: payment.amount.amount_cents,
                currency: payment.amount.currency.code().to_string(),
            },
            order_id: payment.order_id.to_string(),
            autocomplete: true,
        };
        let response = self
            .inner
            .client
            .post(self.url("payments")?)
            .json(&body)
            .send()
            .await?;
        let parsed: PaymentResponse = handle_response(response).await?;

        let payment = expect_entity(parsed.payment, parsed.errors, "payment")?;
        if let Some(status) = payment
            .status
            .as_deref()
            .filter(|s| FAILED_PAYMENT_STATUSES.contains(s))
        {
            return Err(SquareError::Api {
                status: StatusCode::PAYMENT_REQUIRED.as_u16(),
                errors: vec![ApiError {
                    code: Some(status.to_string()),
                    detail: Some(format!("Payment {status}")),
                    ..ApiError::default()
                }],
            });
        }
        debug!(payment_id = %payment.id, "Square payment captured");
        Ok(payment)
    }

    /// Cancel an order.
    ///
    /// # Errors
    ///
    /// Returns error if credentials are missing, the request fails or Square
    /// refuses the update.
    #[instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        order_id: &str,
        version: Option<i64>,
        idempotency_key: &IdempotencyKey,
    ) -> Result<(), SquareError> {
        let body = UpdateOrderRequest {
            idempotency_key: idempotency_key.to_string(),
            order: OrderStateUpdate {
                location_id: self.location_id()?.to_string(),
                version,
                state: OrderState::Canceled,
            },
        };
        let response = self
            .inner
            .client
            .put(self.url(&format!("orders/{order_id}"))?)
            .json(&body)
            .send()
            .await?;
        let _: OrderResponse = handle_response(response).await?;
        Ok(())
    }
}

#[async_trait]
impl CommerceApi for SquareClient {
    async fn create_order(
        &self,
        order: &OrderDraft,
        idempotency_key: &IdempotencyKey,
    ) -> Result<CreatedOrder, RemoteError> {
        let created = Self::create_order(self, order, idempotency_key).await?;
        Ok(CreatedOrder {
            id: RemoteOrderId::new(created.id),
            version: created.version,
            total_cents: created.total_money.map(|money| money.amount),
        })
    }

    async fn create_payment(
        &self,
        payment: &PaymentRequest,
        idempotency_key: &IdempotencyKey,
    ) -> Result<PaymentId, RemoteError> {
        let payment = Self::create_payment(self, payment, idempotency_key).await?;
        Ok(PaymentId::new(payment.id))
    }

    async fn cancel_order(
        &self,
        order: &CreatedOrder,
        idempotency_key: &IdempotencyKey,
    ) -> Result<(), RemoteError> {
        Self::cancel_order(self, order.id.as_str(), order.version, idempotency_key).await?;
        Ok(())
    }
}

impl std::fmt::Debug for SquareClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SquareClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("location_id", &self.inner.location_id)
            .finish_non_exhaustive()
    }
}

fn auth_header(token: &SecretString) -> Result<HeaderValue, SquareError> {
    let mut value = HeaderValue::from_str(&bearer(token))
        .map_err(|e| SquareError::Parse(format!("Invalid access token format: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Parse a success body, or turn an error status into [`SquareError`].
async fn handle_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, SquareError> {
    let status = response.status();

    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| SquareError::Parse(format!("Failed to parse response: {e}")));
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        return Err(SquareError::RateLimited(retry_after));
    }

    let errors = response
        .json::<ErrorResponse>()
        .await
        .map(|body| body.errors)
        .unwrap_or_default();

    Err(SquareError::Api {
        status: status.as_u16(),
        errors,
    })
}

/// A 2xx body must carry the entity; if it only carries errors, surface them.
fn expect_entity<T>(
    entity: Option<T>,
    errors: Vec<ApiError>,
    what: &str,
) -> Result<T, SquareError> {
    match entity {
        Some(entity) => Ok(entity),
        None if !errors.is_empty() => Err(SquareError::Api {
            status: StatusCode::BAD_REQUEST.as_u16(),
            errors,
        }),
        None => Err(SquareError::Parse(format!("Response did not include the {what}"))),
    }
}
