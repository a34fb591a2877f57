//! Checkout orchestration.
//!
//! # Flow
//!
//! ```text
//! Received ─► Sanitized ─► Totaled ─► OrderAssembled ─► OrderCreated ─► PaymentCaptured ─► Succeeded
//!     └──────────┴────────────┴────────────┴───────────────┴─────────────────┴──► Failed(reason)
//! ```
//!
//! Everything up to `OrderAssembled` is local and pure. The two remote calls
//! are strictly sequential: payment capture needs the created order's ID and
//! is only attempted once creation has succeeded. Each remote call carries a
//! fresh idempotency key.
//!
//! When a payment is definitively rejected, or the platform reports an order
//! total that differs from the computed one, the created order is cancelled
//! on a best-effort basis so that it does not linger as an unpaid ticket.

mod request;

pub use request::{CheckoutPayload, ContactPayload, ValidatedCheckout};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use orderline_core::{
    CheckoutError, CheckoutId, IdempotencyKey, Money, OrderDraft, PaymentId, PriceAuthority,
    PricingConfig, RemoteOrderId, Totals, assemble_order, compute_totals, sanitize,
};
use thiserror::Error;
use tracing::{Instrument, debug, error, info, info_span, warn};

// =============================================================================
// Remote Commerce Seam
// =============================================================================

/// Failure of a single remote call, before it is mapped to a checkout stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The platform answered and said no. Carries its detail message.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The platform answered with a server-side failure. The call may or may
    /// not have taken effect.
    #[error("failed: {0}")]
    Indeterminate(String),

    /// The platform could not be reached or did not answer in time.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Credentials needed for the call are not configured.
    #[error("not configured: {0}")]
    NotConfigured(String),
}

/// An order accepted by the commerce platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedOrder {
    pub id: RemoteOrderId,
    /// Optimistic-concurrency version, needed to update the order.
    pub version: Option<i64>,
    /// Total the platform computed for the order, when it reports one.
    pub total_cents: Option<u64>,
}

/// A payment capture for a created order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub order_id: RemoteOrderId,
    /// Server-computed total.
    pub amount: Money,
    /// Single-use card token from the browser payment form.
    pub source_token: String,
}

/// The remote order-management and payment-capture service.
#[async_trait]
pub trait CommerceApi: Send + Sync {
    /// Create an order from the assembled document.
    async fn create_order(
        &self,
        order: &OrderDraft,
        idempotency_key: &IdempotencyKey,
    ) -> Result<CreatedOrder, RemoteError>;

    /// Capture a payment against a created order.
    async fn create_payment(
        &self,
        payment: &PaymentRequest,
        idempotency_key: &IdempotencyKey,
    ) -> Result<PaymentId, RemoteError>;

    /// Cancel a created order that will not be paid.
    async fn cancel_order(
        &self,
        order: &CreatedOrder,
        idempotency_key: &IdempotencyKey,
    ) -> Result<(), RemoteError>;
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Pipeline stage, recorded in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStage {
    Received,
    Sanitized,
    Totaled,
    OrderAssembled,
    OrderCreated,
    PaymentCaptured,
    Succeeded,
}

impl CheckoutStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Sanitized => "sanitized",
            Self::Totaled => "totaled",
            Self::OrderAssembled => "order_assembled",
            Self::OrderCreated => "order_created",
            Self::PaymentCaptured => "payment_captured",
            Self::Succeeded => "succeeded",
        }
    }
}

/// A paid order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutReceipt {
    pub order_id: RemoteOrderId,
    pub payment_id: PaymentId,
    pub totals: Totals,
}

const GENERIC_ORDER_FAILURE: &str = "The order could not be created";
const GENERIC_PAYMENT_FAILURE: &str = "The payment could not be completed";
const TOTAL_MISMATCH: &str = "The order total did not match the checkout total";

/// Runs checkouts. Cheap to clone.
#[derive(Clone)]
pub struct CheckoutService {
    inner: Arc<CheckoutServiceInner>,
}

struct CheckoutServiceInner {
    prices: Arc<PriceAuthority>,
    pricing: PricingConfig,
    commerce: Arc<dyn CommerceApi>,
    remote_timeout: Duration,
}

impl CheckoutService {
    /// Create a checkout service.
    #[must_use]
    pub fn new(
        prices: Arc<PriceAuthority>,
        pricing: PricingConfig,
        commerce: Arc<dyn CommerceApi>,
        remote_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(CheckoutServiceInner {
                prices,
                pricing,
                commerce,
                remote_timeout,
            }),
        }
    }

    /// Pricing configuration in effect.
    #[must_use]
    pub fn pricing(&self) -> &PricingConfig {
        &self.inner.pricing
    }

    /// Run one checkout attempt from a raw request payload.
    ///
    /// # Errors
    ///
    /// Returns the [`CheckoutError`] for the stage that failed. Validation
    /// errors are always returned before any remote call is made.
    pub async fn process(&self, payload: CheckoutPayload) -> Result<CheckoutReceipt, CheckoutError> {
        let checkout_id = CheckoutId::generate();
        let span = info_span!("checkout", checkout_id = %checkout_id);

        async move {
            let mut stage = CheckoutStage::Received;
            let result = self.run(payload, &mut stage).await;
            match &result {
                Ok(receipt) => info!(
                    order_id = %receipt.order_id,
                    payment_id = %receipt.payment_id,
                    total_cents = receipt.totals.total_cents,
                    "Checkout succeeded"
                ),
                Err(e) if e.is_validation() => info!(
                    failed_after = stage.as_str(),
                    reason = e.kind(),
                    error = %e,
                    "Checkout rejected"
                ),
                Err(e) => warn!(
                    failed_after = stage.as_str(),
                    reason = e.kind(),
                    error = %e,
                    "Checkout failed"
                ),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        payload: CheckoutPayload,
        stage: &mut CheckoutStage,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let checkout = payload.validate()?;

        // One snapshot for the whole request: a concurrent reload is seen
        // either entirely or not at all.
        let prices = self.inner.prices.snapshot();
        let lines = sanitize(&checkout.items, &prices)?;
        advance(stage, CheckoutStage::Sanitized);

        let config = &self.inner.pricing;
        let totals = compute_totals(&lines, checkout.fulfillment.kind(), config)?;
        advance(stage, CheckoutStage::Totaled);

        let order = assemble_order(&lines, &checkout.contact, &checkout.fulfillment, config)?;
        advance(stage, CheckoutStage::OrderAssembled);

        let created = self
            .remote(self.inner.commerce.create_order(&order, &IdempotencyKey::generate()))
            .await
            .map_err(|e| {
                e.into_checkout_error(CheckoutError::OrderCreationFailed, GENERIC_ORDER_FAILURE)
            })?;

        // Never charge an amount the platform does not agree with.
        if let Some(remote_total) = created
            .total_cents
            .filter(|&cents| cents != totals.total_cents)
        {
            warn!(
                order_id = %created.id,
                remote_total,
                total_cents = totals.total_cents,
                "Order total mismatch"
            );
            self.compensate(&created).await;
            return Err(CheckoutError::OrderCreationFailed(TOTAL_MISMATCH.to_string()));
        }
        advance(stage, CheckoutStage::OrderCreated);

        let payment = PaymentRequest {
            order_id: created.id.clone(),
            amount: Money::new(totals.total_cents, config.currency),
            source_token: checkout.payment_token,
        };
        let payment_id = match self
            .remote(
                self.inner
                    .commerce
                    .create_payment(&payment, &IdempotencyKey::generate()),
            )
            .await
        {
            Ok(payment_id) => payment_id,
            Err(RemoteError::Rejected(detail)) => {
                self.compensate(&created).await;
                return Err(CheckoutError::PaymentCaptureFailed(detail_or(
                    detail,
                    GENERIC_PAYMENT_FAILURE,
                )));
            }
            Err(other) => {
                // The capture may or may not have happened; leave the order
                // for reconciliation.
                if !matches!(other, RemoteError::NotConfigured(_)) {
                    error!(
                        order_id = %created.id,
                        error = %other,
                        "Payment outcome unknown, order requires manual reconciliation"
                    );
                }
                return Err(other.into_checkout_error(
                    CheckoutError::PaymentCaptureFailed,
                    GENERIC_PAYMENT_FAILURE,
                ));
            }
        };
        advance(stage, CheckoutStage::PaymentCaptured);
        advance(stage, CheckoutStage::Succeeded);

        Ok(CheckoutReceipt {
            order_id: created.id,
            payment_id,
            totals,
        })
    }

    /// Best-effort cancellation of an order whose payment was rejected.
    async fn compensate(&self, created: &CreatedOrder) {
        match self
            .remote(
                self.inner
                    .commerce
                    .cancel_order(created, &IdempotencyKey::generate()),
            )
            .await
        {
            Ok(()) => info!(order_id = %created.id, "Cancelled unpaid order"),
            Err(e) => error!(
                order_id = %created.id,
                error = %e,
                "Failed to cancel unpaid order, requires manual reconciliation"
            ),
        }
    }

    /// Apply the per-call timeout.
    async fn remote<T>(
        &self,
        call: impl Future<Output = Result<T, RemoteError>>,
    ) -> Result<T, RemoteError> {
        let limit = self.inner.remote_timeout;
        tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
            Err(RemoteError::Unavailable(format!(
                "no response within {} seconds",
                limit.as_secs()
            )))
        })
    }
}

impl RemoteError {
    /// Map to the checkout error for the stage that made the call. Any answer
    /// from the platform is a stage failure; only a missing answer is an
    /// outage.
    fn into_checkout_error(
        self,
        stage_failure: fn(String) -> CheckoutError,
        fallback: &str,
    ) -> CheckoutError {
        match self {
            Self::Rejected(detail) | Self::Indeterminate(detail) => {
                stage_failure(detail_or(detail, fallback))
            }
            Self::Unavailable(detail) => CheckoutError::ProviderUnavailable(detail),
            Self::NotConfigured(detail) => CheckoutError::Configuration(detail),
        }
    }
}

fn advance(stage: &mut CheckoutStage, next: CheckoutStage) {
    debug!(from = stage.as_str(), to = next.as_str(), "Checkout stage");
    *stage = next;
}

fn detail_or(detail: String, fallback: &str) -> String {
    if detail.trim().is_empty() {
        fallback.to_string()
    } else {
        detail
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod testing;
