//! Integration tests for Emberline.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p emberline-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `checkout_flow` - Full wizard walks from info entry to settlement
//! - `payment_methods` - Manual method sub-flows and the exchange-rate feed
//!
//! Every test that touches a timer runs on a paused tokio clock, so the
//! simulated settlement and refresh delays elapse instantly and the suite
//! stays deterministic.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use emberline_checkout::{
    CartLine, Checkout, CheckoutConfig, CheckoutEvent, InMemoryCart,
};
use emberline_core::ProductId;
use rust_decimal::Decimal;
use tokio::sync::mpsc::UnboundedReceiver;

/// A cart holding one $100.00 item, the fixture most tests start from.
#[must_use]
pub fn seeded_cart() -> Arc<InMemoryCart> {
    let cart = Arc::new(InMemoryCart::new());
    cart.add(CartLine {
        product_id: ProductId::new(1),
        title: "Aurum Chronograph".to_string(),
        unit_price: Decimal::new(10000, 2),
        quantity: 1,
        image_url: Some("https://cdn.emberline.test/aurum.jpg".to_string()),
    });
    cart
}

/// Open a checkout over [`seeded_cart`] with the default configuration.
#[must_use]
pub fn open_checkout() -> (Checkout, UnboundedReceiver<CheckoutEvent>) {
    Checkout::open(seeded_cart(), CheckoutConfig::default())
}

/// Fill the buyer form with values that pass validation.
pub fn fill_valid_buyer(checkout: &Checkout) {
    checkout.set_name("Ada Lovelace");
    checkout.set_email("ada@example.com");
    checkout.set_address("12 Analytical Way, London");
}

/// Walk the wizard from `Info` to the payment method-select screen.
///
/// # Panics
///
/// Panics if any transition is refused; callers start from a fresh session.
pub fn walk_to_payment(checkout: &Checkout) {
    fill_valid_buyer(checkout);
    checkout.advance().unwrap();
    checkout.advance().unwrap();
    checkout.advance().unwrap();
}

/// Drain every event currently queued on the receiver.
pub fn drain(events: &mut UnboundedReceiver<CheckoutEvent>) -> Vec<CheckoutEvent> {
    std::iter::from_fn(|| events.try_recv().ok()).collect()
}

/// Install a tracing subscriber honoring `RUST_LOG`, for debugging a failing
/// test with `RUST_LOG=emberline_checkout=debug`. Safe to call from multiple
/// tests; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
