//! Static shipping catalog.
//!
//! Three flat-rate options in ascending price order. The first option is
//! always a safe default, so selection needs no validation.

use emberline_core::money::round_currency;
use rust_decimal::Decimal;

/// A flat-rate shipping option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingOption {
    pub id: &'static str,
    pub name: &'static str,
    price_cents: i64,
    pub description: &'static str,
}

impl ShippingOption {
    /// The flat price of this option.
    #[must_use]
    pub fn price(&self) -> Decimal {
        Decimal::new(self.price_cents, 2)
    }
}

const OPTIONS: [ShippingOption; 3] = [
    ShippingOption {
        id: "standard",
        name: "Standard Shipping",
        price_cents: 5_00,
        description: "5-7 business days",
    },
    ShippingOption {
        id: "express",
        name: "Express Shipping",
        price_cents: 15_00,
        description: "2-3 business days",
    },
    ShippingOption {
        id: "next-day",
        name: "Next-Day Air",
        price_cents: 25_00,
        description: "Next business day",
    },
];

/// All shipping options, cheapest first.
#[must_use]
pub const fn options() -> &'static [ShippingOption] {
    &OPTIONS
}

/// The default selection (the first, cheapest option).
#[must_use]
pub const fn default_option() -> &'static ShippingOption {
    let [first, ..] = &OPTIONS;
    first
}

/// Look up an option by id.
#[must_use]
pub fn get(id: &str) -> Option<&'static ShippingOption> {
    OPTIONS.iter().find(|option| option.id == id)
}

/// Order total: subtotal plus the selected option's flat price, rounded to
/// two decimal places for currency display.
#[must_use]
pub fn total_with_shipping(subtotal: Decimal, option: &ShippingOption) -> Decimal {
    round_currency(subtotal + option.price())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_three_options_ascending_price() {
        let all = options();
        assert_eq!(all.len(), 3);
        assert!(
            all.windows(2)
                .all(|pair| pair.first().unwrap().price() < pair.last().unwrap().price())
        );
    }

    #[test]
    fn test_default_is_cheapest() {
        assert_eq!(default_option().id, "standard");
        assert_eq!(default_option().price(), Decimal::new(500, 2));
    }

    #[test]
    fn test_get_by_id() {
        assert_eq!(get("express").unwrap().name, "Express Shipping");
        assert!(get("drone").is_none());
    }

    #[test]
    fn test_total_with_shipping() {
        let express = get("express").unwrap();
        let total = total_with_shipping(Decimal::new(10000, 2), express);
        assert_eq!(total, Decimal::new(11500, 2));
    }
}
