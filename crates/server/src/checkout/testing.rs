//! In-process [`CommerceApi`] double that records every call.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use orderline_core::{IdempotencyKey, OrderDraft, PaymentId, RemoteOrderId};

use super::{CommerceApi, CreatedOrder, PaymentRequest, RemoteError};

/// One recorded remote call.
#[derive(Debug, Clone)]
pub enum Call {
    CreateOrder {
        order: OrderDraft,
        idempotency_key: String,
    },
    CreatePayment {
        payment: PaymentRequest,
        idempotency_key: String,
    },
    CancelOrder {
        order_id: String,
        idempotency_key: String,
    },
}

impl Call {
    #[must_use]
    pub fn idempotency_key(&self) -> &str {
        match self {
            Self::CreateOrder {
                idempotency_key, ..
            }
            | Self::CreatePayment {
                idempotency_key, ..
            }
            | Self::CancelOrder {
                idempotency_key, ..
            } => idempotency_key,
        }
    }
}

/// Answers with scripted outcomes. Order and payment IDs are numbered
/// `order-1`, `payment-1`, ... in call order.
#[derive(Debug, Default)]
pub struct ScriptedCommerce {
    order_failure: Option<RemoteError>,
    payment_failure: Option<RemoteError>,
    order_total: Option<u64>,
    delay: Option<Duration>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedCommerce {
    /// Every call succeeds.
    #[must_use]
    pub fn succeeding() -> Self {
        Self::default()
    }

    /// Order creation fails with `error`.
    #[must_use]
    pub fn failing_order(error: RemoteError) -> Self {
        Self {
            order_failure: Some(error),
            ..Self::default()
        }
    }

    /// Order creation succeeds, payment capture fails with `error`.
    #[must_use]
    pub fn failing_payment(error: RemoteError) -> Self {
        Self {
            payment_failure: Some(error),
            ..Self::default()
        }
    }

    /// Report `total_cents` as the platform's total for created orders.
    #[must_use]
    pub const fn with_order_total(mut self, total_cents: u64) -> Self {
        self.order_total = Some(total_cents);
        self
    }

    /// Sleep before answering each call.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Calls made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().clone()
    }

    #[must_use]
    pub fn payment_calls(&self) -> usize {
        self.lock()
            .iter()
            .filter(|call| matches!(call, Call::CreatePayment { .. }))
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Call>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `call` and return how many calls of the same kind came before.
    fn record(&self, call: Call) -> usize {
        let mut calls = self.lock();
        let same_kind = calls
            .iter()
            .filter(|c| std::mem::discriminant(*c) == std::mem::discriminant(&call))
            .count();
        calls.push(call);
        same_kind
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl CommerceApi for ScriptedCommerce {
    async fn create_order(
        &self,
        order: &OrderDraft,
        idempotency_key: &IdempotencyKey,
    ) -> Result<CreatedOrder, RemoteError> {
        let seen = self.record(Call::CreateOrder {
            order: order.clone(),
            idempotency_key: idempotency_key.to_string(),
        });
        self.pause().await;

        match &self.order_failure {
            Some(error) => Err(error.clone()),
            None => Ok(CreatedOrder {
                id: RemoteOrderId::new(format!("order-{}", seen + 1)),
                version: Some(1),
                total_cents: self.order_total,
            }),
        }
    }

    async fn create_payment(
        &self,
        payment: &PaymentRequest,
        idempotency_key: &IdempotencyKey,
    ) -> Result<PaymentId, RemoteError> {
        let seen = self.record(Call::CreatePayment {
            payment: payment.clone(),
            idempotency_key: idempotency_key.to_string(),
        });
        self.pause().await;

        match &self.payment_failure {
            Some(error) => Err(error.clone()),
            None => Ok(PaymentId::new(format!("payment-{}", seen + 1))),
        }
    }

    async fn cancel_order(
        &self,
        order: &CreatedOrder,
        idempotency_key: &IdempotencyKey,
    ) -> Result<(), RemoteError> {
        self.record(Call::CancelOrder {
            order_id: order.id.to_string(),
            idempotency_key: idempotency_key.to_string(),
        });
        self.pause().await;
        Ok(())
    }
}
