//! End-to-end wizard walks: info entry through settlement.
//!
//! These tests drive the public `Checkout` handle the way a storefront shell
//! would, asserting on the emitted events and on render snapshots rather
//! than on internals.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use emberline_checkout::view::{PaymentView, StepStatus};
use emberline_checkout::{
    Cart, Checkout, CheckoutConfig, CheckoutError, CheckoutEvent, InMemoryCart, PaymentMethod,
    PaymentProof, Step, StepId,
};
use emberline_integration_tests::{
    drain, fill_valid_buyer, init_tracing, open_checkout, seeded_cart, walk_to_payment,
};

// =============================================================================
// Validation gating
// =============================================================================

#[test]
fn test_blank_form_is_gated_with_field_messages() {
    let (checkout, _events) = open_checkout();

    let err = checkout.advance().unwrap_err();
    let CheckoutError::Validation(errors) = err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert_eq!(errors.name.as_deref(), Some("Full name is required."));
    assert_eq!(errors.email.as_deref(), Some("Email is required."));
    assert_eq!(
        errors.address.as_deref(),
        Some("Shipping address is required.")
    );
    assert_eq!(checkout.step(), Step::Info);
}

#[test]
fn test_invalid_email_is_gated_until_corrected() {
    let (checkout, _events) = open_checkout();
    checkout.set_name("Ada Lovelace");
    checkout.set_email("not-an-email");
    checkout.set_address("12 Analytical Way");

    assert!(checkout.advance().is_err());
    assert_eq!(
        checkout.validation_errors().email.as_deref(),
        Some("Email is invalid.")
    );

    // Editing the field clears the stale message; a valid value passes.
    checkout.set_email("ada@example.com");
    assert!(checkout.validation_errors().email.is_none());
    assert_eq!(checkout.advance().unwrap(), Step::Shipping);
}

#[test]
fn test_validation_reruns_after_backtracking() {
    let (checkout, _events) = open_checkout();
    fill_valid_buyer(&checkout);
    checkout.advance().unwrap();

    // Go back and blank a field; the gate must hold again.
    checkout.retreat().unwrap();
    checkout.set_name("");
    assert!(checkout.advance().is_err());
    assert_eq!(checkout.step(), Step::Info);
}

// =============================================================================
// Step navigation
// =============================================================================

#[test]
fn test_full_forward_walk_emits_ordered_step_events() {
    let (checkout, mut events) = open_checkout();
    walk_to_payment(&checkout);

    let steps: Vec<Step> = drain(&mut events)
        .into_iter()
        .filter_map(|event| match event {
            CheckoutEvent::StepChanged { to, .. } => Some(to),
            _ => None,
        })
        .collect();
    assert_eq!(
        steps.last().copied().map(|s| s.id()),
        Some(StepId::Payment)
    );
    assert_eq!(steps.len(), 3);
}

#[test]
fn test_stepper_jump_back_preserves_entered_data() {
    let (checkout, _events) = open_checkout();
    walk_to_payment(&checkout);
    checkout.select_shipping("express");

    checkout.jump_back(StepId::Info).unwrap();
    assert_eq!(checkout.buyer().name, "Ada Lovelace");
    assert_eq!(checkout.selected_shipping().id, "express");

    // The walk forward is gated again but passes with the retained data.
    checkout.advance().unwrap();
    checkout.advance().unwrap();
    checkout.advance().unwrap();
    assert_eq!(checkout.step().id(), StepId::Payment);
}

#[test]
fn test_view_reflects_review_step() {
    let (checkout, _events) = open_checkout();
    fill_valid_buyer(&checkout);
    checkout.advance().unwrap();
    checkout.select_shipping("next-day");
    checkout.advance().unwrap();

    let view = checkout.view();
    assert_eq!(view.step, StepId::Summary);
    assert_eq!(view.subtotal, "$100.00");
    assert_eq!(view.shipping_price, "$25.00");
    assert_eq!(view.total, "$125.00");
    assert_eq!(view.installment, "$31.25");
    let statuses: Vec<StepStatus> = view.stepper.iter().map(|e| e.status).collect();
    assert_eq!(
        statuses,
        vec![
            StepStatus::Completed,
            StepStatus::Completed,
            StepStatus::Current,
            StepStatus::Upcoming,
        ]
    );
}

// =============================================================================
// Settlement
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_card_checkout_settles_and_resets() {
    init_tracing();
    let (checkout, mut events) = open_checkout();
    walk_to_payment(&checkout);
    drain(&mut events);

    checkout.select_payment_method(PaymentMethod::Card).unwrap();
    assert!(checkout.is_processing());
    assert_eq!(
        drain(&mut events),
        vec![CheckoutEvent::PaymentSubmitted {
            method: PaymentMethod::Card
        }]
    );

    // Nothing settles before the delay elapses.
    tokio::time::sleep(Duration::from_millis(2400)).await;
    assert!(checkout.is_processing());
    assert!(drain(&mut events).is_empty());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(drain(&mut events), vec![CheckoutEvent::CommitSuccess]);

    // The session is a fresh one: back at Info, form blank, defaults restored.
    assert_eq!(checkout.step(), Step::Info);
    assert!(!checkout.is_processing());
    assert_eq!(checkout.buyer().name, "");
    assert_eq!(checkout.selected_shipping().id, "standard");
}

#[tokio::test(start_paused = true)]
async fn test_wizard_is_frozen_while_settling() {
    let (checkout, _events) = open_checkout();
    walk_to_payment(&checkout);
    checkout.submit_payment(PaymentMethod::Card).unwrap();

    assert!(matches!(checkout.retreat(), Err(CheckoutError::Processing)));
    assert!(matches!(
        checkout.jump_back(StepId::Info),
        Err(CheckoutError::Processing)
    ));
    assert!(matches!(
        checkout.select_payment_method(PaymentMethod::Swish),
        Err(CheckoutError::Processing)
    ));
    assert!(matches!(
        checkout.submit_payment(PaymentMethod::Card),
        Err(CheckoutError::Processing)
    ));
    assert!(matches!(
        checkout.attach_proof(PaymentProof::new("late.png".to_string(), vec![0])),
        Err(CheckoutError::Processing)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_close_during_settlement_never_commits() {
    let (checkout, mut events) = open_checkout();
    walk_to_payment(&checkout);
    checkout.submit_payment(PaymentMethod::Card).unwrap();
    drain(&mut events);

    checkout.close();
    assert_eq!(drain(&mut events), vec![CheckoutEvent::Closed]);

    // Let the abandoned settlement timer fire; it must be discarded.
    tokio::time::sleep(Duration::from_millis(10_000)).await;
    assert!(drain(&mut events).is_empty());
    assert_eq!(checkout.step(), Step::Info);
    assert!(!checkout.is_processing());
}

#[tokio::test(start_paused = true)]
async fn test_empty_cart_blocks_payment_but_not_navigation() {
    let cart = Arc::new(InMemoryCart::new());
    let (checkout, _events) = Checkout::open(cart, CheckoutConfig::default());
    walk_to_payment(&checkout);

    assert!(matches!(
        checkout.submit_payment(PaymentMethod::Card),
        Err(CheckoutError::EmptyCart)
    ));

    // Manual methods are refused too; the detail screen never opens.
    assert!(matches!(
        checkout.select_payment_method(PaymentMethod::Crypto),
        Err(CheckoutError::EmptyCart)
    ));
    assert_eq!(checkout.step().id(), StepId::Payment);

    let view = checkout.view();
    assert!(!view.can_proceed);
    let Some(PaymentView::MethodSelect { methods }) = view.payment else {
        panic!("expected method-select view");
    };
    assert!(methods.iter().all(|b| !b.enabled));
}

// =============================================================================
// Draft persistence
// =============================================================================

#[test]
fn test_buyer_form_round_trips_as_json() {
    // Hosts persist the in-progress form between visits.
    let (checkout, _events) = open_checkout();
    fill_valid_buyer(&checkout);

    let draft = serde_json::to_string(&checkout.buyer()).unwrap();
    let restored: emberline_checkout::BuyerInfo = serde_json::from_str(&draft).unwrap();
    assert_eq!(restored, checkout.buyer());

    let (fresh, _events) = open_checkout();
    fresh.set_name(restored.name);
    fresh.set_email(restored.email);
    fresh.set_address(restored.address);
    assert_eq!(fresh.advance().unwrap(), Step::Shipping);
}

// =============================================================================
// Cart edits mid-wizard
// =============================================================================

#[test]
fn test_quantity_edits_flow_into_totals() {
    let (checkout, _events) = open_checkout();
    checkout.set_line_quantity(emberline_core::ProductId::new(1), 3);

    assert_eq!(checkout.view().subtotal, "$300.00");

    // Zero removes the line and the wizard can no longer pay.
    checkout.set_line_quantity(emberline_core::ProductId::new(1), 0);
    let view = checkout.view();
    assert!(view.items.is_empty());
    assert!(!view.can_proceed);
}

#[tokio::test(start_paused = true)]
async fn test_host_clears_cart_on_commit_success() {
    // The engine never empties the cart itself; the host does on commit.
    let cart = seeded_cart();
    let (checkout, mut events) =
        Checkout::open(cart.clone(), CheckoutConfig::default());
    walk_to_payment(&checkout);
    checkout.submit_payment(PaymentMethod::Card).unwrap();

    tokio::time::sleep(Duration::from_millis(2600)).await;
    assert!(drain(&mut events).contains(&CheckoutEvent::CommitSuccess));
    assert!(!cart.lines().is_empty());

    cart.clear();
    assert!(cart.lines().is_empty());
}
