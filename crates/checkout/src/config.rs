//! Checkout engine configuration loaded from environment variables.
//!
//! All variables are optional; defaults match the simulated storefront.
//!
//! # Environment Variables
//!
//! - `CHECKOUT_SETTLEMENT_MS` - Simulated settlement delay (default: 2500)
//! - `CHECKOUT_COPY_CONFIRMATION_MS` - "Copied!" confirmation duration (default: 2000)
//! - `CHECKOUT_ORACLE_LATENCY_MS` - Exchange-rate refresh latency (default: 1000)
//! - `CHECKOUT_INITIAL_RATE` - Initial ETH/USD exchange rate (default: 3000)
//! - `CHECKOUT_RATE_JITTER` - Max refresh perturbation in USD (default: 100)
//! - `CHECKOUT_WALLET_ADDRESS` - Crypto wallet address shown to the buyer
//! - `CHECKOUT_TRANSFER_NUMBER` - Swish number shown to the buyer

use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

const DEFAULT_SETTLEMENT_MS: u64 = 2500;
const DEFAULT_COPY_CONFIRMATION_MS: u64 = 2000;
const DEFAULT_ORACLE_LATENCY_MS: u64 = 1000;
const DEFAULT_INITIAL_RATE: i64 = 3000;
const DEFAULT_RATE_JITTER: i64 = 100;
const DEFAULT_WALLET_ADDRESS: &str = "0x1A2b3c4D5e6F7a8B9c0D1e2F3a4B5c6D7e8F9a0B";
const DEFAULT_TRANSFER_NUMBER: &str = "123-456 78 90";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Checkout engine configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Simulated settlement delay after a payment submission.
    pub settlement_delay: Duration,
    /// How long the copy-to-clipboard confirmation stays visible.
    pub copy_confirmation: Duration,
    /// Simulated latency of an exchange-rate refresh.
    pub oracle_latency: Duration,
    /// Initial ETH/USD exchange rate.
    pub initial_rate: Decimal,
    /// Maximum perturbation applied by a rate refresh, in USD.
    pub rate_jitter: Decimal,
    /// Wallet address displayed for crypto payments.
    pub wallet_address: String,
    /// Swish number displayed for regional-transfer payments.
    pub transfer_number: String,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            settlement_delay: Duration::from_millis(DEFAULT_SETTLEMENT_MS),
            copy_confirmation: Duration::from_millis(DEFAULT_COPY_CONFIRMATION_MS),
            oracle_latency: Duration::from_millis(DEFAULT_ORACLE_LATENCY_MS),
            initial_rate: Decimal::from(DEFAULT_INITIAL_RATE),
            rate_jitter: Decimal::from(DEFAULT_RATE_JITTER),
            wallet_address: DEFAULT_WALLET_ADDRESS.to_string(),
            transfer_number: DEFAULT_TRANSFER_NUMBER.to_string(),
        }
    }
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present. Every
    /// variable falls back to its default when unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a set variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let defaults = Self::default();
        Ok(Self {
            settlement_delay: env_duration_ms("CHECKOUT_SETTLEMENT_MS", defaults.settlement_delay)?,
            copy_confirmation: env_duration_ms(
                "CHECKOUT_COPY_CONFIRMATION_MS",
                defaults.copy_confirmation,
            )?,
            oracle_latency: env_duration_ms("CHECKOUT_ORACLE_LATENCY_MS", defaults.oracle_latency)?,
            initial_rate: env_decimal("CHECKOUT_INITIAL_RATE", defaults.initial_rate)?,
            rate_jitter: env_decimal("CHECKOUT_RATE_JITTER", defaults.rate_jitter)?,
            wallet_address: env_string("CHECKOUT_WALLET_ADDRESS", defaults.wallet_address),
            transfer_number: env_string("CHECKOUT_TRANSFER_NUMBER", defaults.transfer_number),
        })
    }
}

fn env_string(name: &str, default: String) -> String {
    std::env::var(name).unwrap_or(default)
}

fn env_duration_ms(name: &str, default: Duration) -> Result<Duration, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

fn env_decimal(name: &str, default: Decimal) -> Result<Decimal, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<Decimal>()
            .map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}
