//! Checkout server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Commerce platform (reported by `/selftest` when missing)
//! - `SQUARE_ACCESS_TOKEN` - Bearer token for the Orders and Payments APIs
//! - `SQUARE_APPLICATION_ID` - Public application ID (served by `/config`)
//! - `SQUARE_LOCATION_ID` - The single location orders are created for
//!
//! ## Optional
//! - `CHECKOUT_HOST` - Bind address (default: 127.0.0.1)
//! - `CHECKOUT_PORT` - Listen port (default: 3000)
//! - `SQUARE_ENV` - `sandbox` or `production` (default: sandbox)
//! - `SQUARE_API_VERSION` - `Square-Version` header (default: 2024-10-17)
//! - `SQUARE_BASE_URL` - Override the API base URL (default: derived from `SQUARE_ENV`)
//! - `REMOTE_TIMEOUT_SECS` - Timeout for each remote call (default: 15)
//! - `TAX_RATE_PERCENT` - Sales tax percentage, e.g. `8.875` (default: 0)
//! - `DELIVERY_FEE_CENTS` - Flat delivery fee (default: 0)
//! - `CURRENCY` - ISO 4217 code (default: USD)
//! - `PRICE_FILE` - JSON price table that replaces the built-in menu
//! - `PRICE_FILE_POLL_SECS` - How often to check the price file (default: 5)
//! - `REQUIRED_PRICE_KEYS` - Comma-separated items `/selftest` requires (default: built-in menu)
//! - `STATIC_DIR` - Serve a static site with `index.html` fallback
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use orderline_core::{CurrencyCode, PriceTable, PricingConfig};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const SANDBOX_BASE_URL: &str = "https://connect.squareupsandbox.com/v2/";
const PRODUCTION_BASE_URL: &str = "https://connect.squareup.com/v2/";
const DEFAULT_API_VERSION: &str = "2024-10-17";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Which commerce platform environment to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SquareEnvironment {
    Sandbox,
    Production,
}

impl SquareEnvironment {
    /// Name reported by `/config` and `/selftest`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }

    const fn default_base_url(self) -> &'static str {
        match self {
            Self::Sandbox => SANDBOX_BASE_URL,
            Self::Production => PRODUCTION_BASE_URL,
        }
    }
}

impl FromStr for SquareEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Self::Sandbox),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("expected sandbox or production, got {other:?}")),
        }
    }
}

/// Checkout server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Commerce platform configuration
    pub square: SquareConfig,
    /// Tax rate, delivery fee and currency
    pub pricing: PricingConfig,
    /// Price table source and health requirements
    pub prices: PriceSourceConfig,
    /// Directory with the static front end, if served by this process
    pub static_dir: Option<PathBuf>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Commerce platform (Square) configuration.
///
/// Implements `Debug` manually to redact the access token. Credentials are
/// optional so the server can start and report them through `/selftest`.
#[derive(Clone)]
pub struct SquareConfig {
    /// Sandbox or production
    pub environment: SquareEnvironment,
    /// Bearer token for Orders and Payments
    pub access_token: Option<SecretString>,
    /// Public application ID
    pub application_id: Option<String>,
    /// Location orders are created at
    pub location_id: Option<String>,
    /// Value of the `Square-Version` header
    pub api_version: String,
    /// API base URL, always ending in `/`
    pub base_url: Url,
    /// Upper bound for each remote call
    pub timeout: Duration,
}

impl std::fmt::Debug for SquareConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SquareConfig")
            .field("environment", &self.environment)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("application_id", &self.application_id)
            .field("location_id", &self.location_id)
            .field("api_version", &self.api_version)
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SquareConfig {
    /// Names of required credentials that are not set.
    #[must_use]
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.access_token.is_none() {
            missing.push("SQUARE_ACCESS_TOKEN");
        }
        if self.application_id.is_none() {
            missing.push("SQUARE_APPLICATION_ID");
        }
        if self.location_id.is_none() {
            missing.push("SQUARE_LOCATION_ID");
        }
        missing
    }
}

/// Where prices come from and what `/selftest` expects to find.
#[derive(Debug, Clone)]
pub struct PriceSourceConfig {
    /// JSON price file replacing the built-in menu
    pub file: Option<PathBuf>,
    /// Polling interval for file changes
    pub poll_interval: Duration,
    /// Items that must be priced for the table to be healthy
    pub required_keys: Vec<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid, or if the
    /// access token looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let host = env.parse_or("CHECKOUT_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = env.parse_or("CHECKOUT_PORT", 3000_u16)?;

        let environment = env.parse_or("SQUARE_ENV", SquareEnvironment::Sandbox)?;
        let base_url = env
            .optional("SQUARE_BASE_URL")
            .unwrap_or_else(|| environment.default_base_url().to_string());
        let square = SquareConfig {
            environment,
            access_token: env
                .optional("SQUARE_ACCESS_TOKEN")
                .map(|token| {
                    validate_secret_strength(&token, "SQUARE_ACCESS_TOKEN")?;
                    Ok::<_, ConfigError>(SecretString::from(token))
                })
                .transpose()?,
            application_id: env.optional("SQUARE_APPLICATION_ID"),
            location_id: env.optional("SQUARE_LOCATION_ID"),
            api_version: env
                .optional("SQUARE_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            base_url: parse_base_url(&base_url)?,
            timeout: Duration::from_secs(env.parse_or("REMOTE_TIMEOUT_SECS", 15_u64)?),
        };

        let tax_rate_percent = env.parse_or("TAX_RATE_PERCENT", Decimal::ZERO)?;
        if tax_rate_percent.is_sign_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "TAX_RATE_PERCENT".to_string(),
                "must not be negative".to_string(),
            ));
        }
        let pricing = PricingConfig {
            tax_rate_percent,
            delivery_fee_cents: env.parse_or("DELIVERY_FEE_CENTS", 0_u64)?,
            currency: env.parse_or("CURRENCY", CurrencyCode::USD)?,
        };

        let prices = PriceSourceConfig {
            file: env.optional("PRICE_FILE").map(PathBuf::from),
            poll_interval: Duration::from_secs(env.parse_or("PRICE_FILE_POLL_SECS", 5_u64)?.max(1)),
            required_keys: env.optional("REQUIRED_PRICE_KEYS").map_or_else(
                || {
                    PriceTable::default_menu()
                        .names()
                        .map(str::to_string)
                        .collect()
                },
                |keys| {
                    keys.split(',')
                        .map(str::trim)
                        .filter(|key| !key.is_empty())
                        .map(str::to_string)
                        .collect()
                },
            ),
        };

        Ok(Self {
            host,
            port,
            square,
            pricing,
            prices,
            static_dir: env.optional("STATIC_DIR").map(PathBuf::from),
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.parse_or("SENTRY_SAMPLE_RATE", 1.0_f32)?,
            sentry_traces_sample_rate: env.parse_or("SENTRY_TRACES_SAMPLE_RATE", 0.0_f32)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable source wrapper. Blank values count as unset.
struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}

/// Parse the API base URL, making sure relative joins keep its path.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&with_slash)
        .map_err(|e| ConfigError::InvalidEnvVar("SQUARE_BASE_URL".to_string(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

/// Expose the token for the `Authorization` header.
pub(crate) fn bearer(token: &SecretString) -> String {
    format!("Bearer {}", token.expose_secret())
}
