//! Error taxonomy for the checkout engine.
//!
//! Nothing here is fatal: validation errors are field-level and recoverable,
//! and precondition errors correspond to disabled controls in a presentation
//! shell. The worst-case outcome anywhere in the engine is a session reset.

use thiserror::Error;

use crate::validate::ValidationErrors;

/// Errors returned by checkout operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Buyer information failed validation; the field-level messages are
    /// also stored on the session for rendering.
    #[error("buyer information is incomplete")]
    Validation(ValidationErrors),

    /// Submission blocked because the cart has no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// Submission blocked because a manual payment method has no proof
    /// of payment attached.
    #[error("payment proof is required before submission")]
    MissingProof,

    /// A settlement is already in flight; the action is rejected, not queued.
    #[error("a payment is already being processed")]
    Processing,

    /// The operation is not defined for the current step or sub-state.
    #[error("operation is not valid in the current step")]
    InvalidStep,
}

/// Result type alias for `CheckoutError`.
pub type Result<T> = std::result::Result<T, CheckoutError>;
