//! Simulated exchange-rate feed.
//!
//! The checkout session carries one [`ExchangeRate`], refreshed on demand
//! through a [`RateSource`]. The simulated source perturbs a fixed base; a
//! source that returns `None` models a transiently unavailable feed, in
//! which case the previous rate is silently kept.

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places for crypto amount display.
pub const CRYPTO_SCALE: u32 = 6;

/// A quoted exchange rate and when it was quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeRate {
    /// Units of the quote currency per unit of the base asset.
    pub value: Decimal,
    pub as_of: DateTime<Utc>,
}

impl ExchangeRate {
    /// A rate quoted now.
    #[must_use]
    pub fn now(value: Decimal) -> Self {
        Self {
            value,
            as_of: Utc::now(),
        }
    }
}

/// A source of fresh exchange-rate quotes.
pub trait RateSource: Send + Sync {
    /// Quote a fresh rate, or `None` when the feed is unavailable.
    fn quote(&self) -> Option<Decimal>;
}

/// Simulated feed: the base rate plus a bounded random perturbation.
#[derive(Debug, Clone)]
pub struct SimulatedRateSource {
    base: Decimal,
    jitter: Decimal,
}

impl SimulatedRateSource {
    /// Create a source quoting `base ± jitter`.
    #[must_use]
    pub const fn new(base: Decimal, jitter: Decimal) -> Self {
        Self { base, jitter }
    }
}

impl RateSource for SimulatedRateSource {
    fn quote(&self) -> Option<Decimal> {
        // Perturb in cents so the quote stays exact.
        let bound = (self.jitter * Decimal::from(100))
            .trunc()
            .to_i64()
            .unwrap_or(0);
        let delta = if bound == 0 {
            Decimal::ZERO
        } else {
            Decimal::new(rand::rng().random_range(-bound..=bound), 2)
        };
        Some(self.base + delta)
    }
}

/// A feed that is never available. Refreshes against it keep the stale rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableRateSource;

impl RateSource for UnavailableRateSource {
    fn quote(&self) -> Option<Decimal> {
        None
    }
}

/// Convert a quote-currency amount into the base asset at the given rate,
/// rounded to six decimal places for high-precision display.
///
/// A non-positive rate yields zero rather than a division fault.
#[must_use]
pub fn convert(amount: Decimal, rate: Decimal) -> Decimal {
    if rate <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (amount / rate).round_dp_with_strategy(CRYPTO_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_six_decimal_rounding() {
        // 115 / 3000 = 0.0383333... -> 0.038333
        let amount = convert(Decimal::new(11500, 2), Decimal::from(3000));
        assert_eq!(amount, Decimal::new(38333, 6));
    }

    #[test]
    fn test_convert_exact_division() {
        assert_eq!(
            convert(Decimal::from(1500), Decimal::from(3000)),
            Decimal::new(500_000, 6)
        );
    }

    #[test]
    fn test_convert_zero_rate_is_safe() {
        assert_eq!(convert(Decimal::from(100), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(convert(Decimal::from(100), Decimal::from(-1)), Decimal::ZERO);
    }

    #[test]
    fn test_simulated_quotes_stay_within_jitter() {
        let base = Decimal::from(3000);
        let jitter = Decimal::from(100);
        let source = SimulatedRateSource::new(base, jitter);
        for _ in 0..200 {
            let quote = source.quote().unwrap();
            assert!(quote >= base - jitter, "quote {quote} below bound");
            assert!(quote <= base + jitter, "quote {quote} above bound");
        }
    }

    #[test]
    fn test_zero_jitter_quotes_base() {
        let source = SimulatedRateSource::new(Decimal::from(3000), Decimal::ZERO);
        assert_eq!(source.quote().unwrap(), Decimal::from(3000));
    }

    #[test]
    fn test_unavailable_source() {
        assert!(UnavailableRateSource.quote().is_none());
    }
}
