//! Render snapshots.
//!
//! [`CheckoutView`] is an immutable, pre-formatted picture of the session for
//! a presentation shell to draw: money already as display strings, the
//! stepper already classified, the payment screen already resolved. Hosts
//! capture a fresh view after every event instead of reading live state.

use emberline_core::{CurrencyCode, Price, ProductId};
use rust_decimal::Decimal;

use crate::payment::{ManualMethod, PaymentMethod};
use crate::session::{Checkout, PaymentStage, Step, StepId};
use crate::shipping;
use crate::validate::{BuyerInfo, ValidationErrors};

fn usd(amount: Decimal) -> String {
    Price::new(amount, CurrencyCode::USD).display()
}

/// How a step renders in the stepper header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Behind the current step; clickable to jump back.
    Completed,
    Current,
    Upcoming,
}

/// One entry in the stepper header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepperEntry {
    pub id: StepId,
    pub label: &'static str,
    pub status: StepStatus,
}

/// One cart line, money pre-formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItemView {
    pub product_id: ProductId,
    pub title: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    pub image_url: Option<String>,
}

/// One shipping radio row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingOptionView {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub price: String,
    pub selected: bool,
}

/// One button on the method-select screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodButton {
    pub method: PaymentMethod,
    pub label: &'static str,
    /// False while nothing could be submitted (empty cart or settling).
    pub enabled: bool,
}

/// The open manual method's detail screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDetailView {
    pub method: ManualMethod,
    pub title: &'static str,
    pub instructions: &'static str,
    /// The amount to transfer, in the method's own unit.
    pub amount: String,
    /// Fiat equivalent shown under a crypto amount; `None` for fiat methods.
    pub fiat_line: Option<String>,
    /// The conversion rate behind a crypto amount; `None` for fiat methods.
    pub rate_line: Option<String>,
    /// The wallet address or transfer number to copy.
    pub address: String,
    pub copied: bool,
    pub refreshing: bool,
    pub proof_filename: Option<String>,
    pub can_submit: bool,
}

/// Which payment screen is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentView {
    MethodSelect { methods: Vec<MethodButton> },
    Detail(MethodDetailView),
}

/// A full render snapshot of the checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutView {
    pub step: StepId,
    pub stepper: Vec<StepperEntry>,
    pub items: Vec<LineItemView>,
    pub buyer: BuyerInfo,
    pub errors: ValidationErrors,
    pub shipping: Vec<ShippingOptionView>,
    pub subtotal: String,
    pub shipping_price: String,
    pub total: String,
    /// One of four equal installment payments of the total.
    pub installment: String,
    pub processing: bool,
    /// False while the cart is empty; the wizard can render but not pay.
    pub can_proceed: bool,
    /// Present only on the payment step.
    pub payment: Option<PaymentView>,
}

impl CheckoutView {
    /// Capture a snapshot of the session as it stands right now.
    #[must_use]
    pub fn capture(checkout: &Checkout) -> Self {
        let step = checkout.step();
        let current = step.id();
        let selected = checkout.selected_shipping();
        let items: Vec<LineItemView> = checkout
            .cart_lines()
            .into_iter()
            .map(|line| LineItemView {
                product_id: line.product_id,
                title: line.title.clone(),
                quantity: line.quantity,
                unit_price: usd(line.unit_price),
                line_total: usd(line.line_total()),
                image_url: line.image_url,
            })
            .collect();

        Self {
            step: current,
            stepper: StepId::ALL
                .iter()
                .map(|&id| StepperEntry {
                    id,
                    label: id.label(),
                    status: if id.index() < current.index() {
                        StepStatus::Completed
                    } else if id == current {
                        StepStatus::Current
                    } else {
                        StepStatus::Upcoming
                    },
                })
                .collect(),
            can_proceed: !items.is_empty(),
            items,
            buyer: checkout.buyer(),
            errors: checkout.validation_errors(),
            shipping: shipping::options()
                .iter()
                .map(|option| ShippingOptionView {
                    id: option.id,
                    name: option.name,
                    description: option.description,
                    price: usd(option.price()),
                    selected: option.id == selected.id,
                })
                .collect(),
            subtotal: usd(checkout.subtotal()),
            shipping_price: usd(selected.price()),
            total: usd(checkout.total()),
            installment: usd(checkout.installment_amount()),
            processing: checkout.is_processing(),
            payment: match step {
                Step::Payment(stage) => Some(Self::payment_view(checkout, stage)),
                _ => None,
            },
        }
    }

    fn payment_view(checkout: &Checkout, stage: PaymentStage) -> PaymentView {
        match stage {
            PaymentStage::MethodSelect => {
                // Manual methods need no proof yet, but nothing is selectable
                // while settling or with an empty cart.
                let selectable =
                    !checkout.is_processing() && !checkout.cart_lines().is_empty();
                PaymentView::MethodSelect {
                    methods: PaymentMethod::ALL
                        .iter()
                        .map(|&method| MethodButton {
                            method,
                            label: method.label(),
                            enabled: selectable,
                        })
                        .collect(),
                }
            }
            PaymentStage::MethodDetail(manual) => {
                let (amount, fiat_line, rate_line, address) = match manual {
                    ManualMethod::Crypto => (
                        format!("{:.6} ETH", checkout.crypto_amount()),
                        Some(format!("({} USD)", usd(checkout.total()))),
                        Some(format!("1 ETH = {}", usd(checkout.exchange_rate().value))),
                        checkout.config().wallet_address.clone(),
                    ),
                    ManualMethod::Swish => (
                        usd(checkout.total()),
                        None,
                        None,
                        checkout.config().transfer_number.clone(),
                    ),
                };
                PaymentView::Detail(MethodDetailView {
                    method: manual,
                    title: manual.title(),
                    instructions: manual.instructions(),
                    amount,
                    fiat_line,
                    rate_line,
                    address,
                    copied: checkout.address_copied(),
                    refreshing: checkout.is_refreshing(),
                    proof_filename: checkout.proof_filename(),
                    can_submit: checkout.can_submit(manual.method()),
                })
            }
        }
    }
}
