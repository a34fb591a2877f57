//! Application state shared across handlers.

use std::sync::Arc;

use orderline_core::PriceAuthority;

use crate::checkout::{CheckoutService, CommerceApi};
use crate::config::ServerConfig;
use crate::square::{SquareClient, SquareError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    prices: Arc<PriceAuthority>,
    checkout: CheckoutService,
}

impl AppState {
    /// Create state backed by the Square client from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the Square client cannot be built.
    pub fn new(config: ServerConfig, prices: Arc<PriceAuthority>) -> Result<Self, SquareError> {
        let square = SquareClient::new(&config.square)?;
        Ok(Self::with_commerce(config, prices, Arc::new(square)))
    }

    /// Create state with an explicit commerce backend.
    #[must_use]
    pub fn with_commerce(
        config: ServerConfig,
        prices: Arc<PriceAuthority>,
        commerce: Arc<dyn CommerceApi>,
    ) -> Self {
        let checkout = CheckoutService::new(
            prices.clone(),
            config.pricing.clone(),
            commerce,
            config.square.timeout,
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                prices,
                checkout,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get the price authority.
    #[must_use]
    pub fn prices(&self) -> &Arc<PriceAuthority> {
        &self.inner.prices
    }

    /// Get the checkout service.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }
}
