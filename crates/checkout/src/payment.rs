//! Payment methods and their routing.
//!
//! Immediate methods (card, the wallets, installment) submit as soon as they
//! are chosen. Manual methods (crypto, Swish) open a detail sub-flow where
//! the buyer transfers funds out-of-band and attaches proof before the
//! submission is accepted.

use emberline_core::money::round_currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Every payment method the storefront offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    GooglePay,
    ApplePay,
    Installment,
    Crypto,
    Swish,
}

/// How a method settles once chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// Selecting the method submits the payment directly.
    Immediate,
    /// The buyer transfers funds out-of-band and must attach proof.
    Manual,
}

impl PaymentMethod {
    /// All methods in display order.
    pub const ALL: [Self; 6] = [
        Self::Card,
        Self::GooglePay,
        Self::ApplePay,
        Self::Installment,
        Self::Crypto,
        Self::Swish,
    ];

    /// Whether this method submits immediately or via a manual sub-flow.
    #[must_use]
    pub const fn kind(&self) -> MethodKind {
        match self {
            Self::Card | Self::GooglePay | Self::ApplePay | Self::Installment => {
                MethodKind::Immediate
            }
            Self::Crypto | Self::Swish => MethodKind::Manual,
        }
    }

    /// The manual sub-flow this method opens, if any.
    #[must_use]
    pub const fn manual(&self) -> Option<ManualMethod> {
        match self {
            Self::Crypto => Some(ManualMethod::Crypto),
            Self::Swish => Some(ManualMethod::Swish),
            _ => None,
        }
    }

    /// Button label shown on the method-select screen.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Card => "Pay with Card",
            Self::GooglePay => "Pay with Google Pay",
            Self::ApplePay => "Pay with Apple Pay",
            Self::Installment => "Pay in installments",
            Self::Crypto => "Pay with Crypto",
            Self::Swish => "Pay with Swish",
        }
    }
}

/// The subset of methods with a manual detail sub-flow. Keeping this as its
/// own type means a detail screen for an immediate method is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualMethod {
    Crypto,
    Swish,
}

impl ManualMethod {
    /// The corresponding payment method.
    #[must_use]
    pub const fn method(&self) -> PaymentMethod {
        match self {
            Self::Crypto => PaymentMethod::Crypto,
            Self::Swish => PaymentMethod::Swish,
        }
    }

    /// Detail screen title.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Crypto => "Pay with Crypto",
            Self::Swish => "Pay with Swish",
        }
    }

    /// Instructions shown above the address/number.
    #[must_use]
    pub const fn instructions(&self) -> &'static str {
        match self {
            Self::Crypto => {
                "Scan QR code or copy the address below to send your payment. \
                 Once sent, you must upload proof of the transaction."
            }
            Self::Swish => {
                "Open your Swish app and pay to the number below. \
                 Once sent, you must upload proof of the transaction."
            }
        }
    }
}

impl From<ManualMethod> for PaymentMethod {
    fn from(manual: ManualMethod) -> Self {
        manual.method()
    }
}

/// An opaque proof-of-payment attachment held client-side; never uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentProof {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl PaymentProof {
    /// Create a proof attachment.
    #[must_use]
    pub const fn new(filename: String, bytes: Vec<u8>) -> Self {
        Self { filename, bytes }
    }
}

/// One of four equal interest-free payments, rounded to two decimal places.
/// Display-only; the full total still settles at once.
#[must_use]
pub fn installment_amount(total: Decimal) -> Decimal {
    round_currency(total / Decimal::from(4))
}
