//! The checkout session state machine.
//!
//! One [`Checkout`] handle owns one session: the aggregate of current step,
//! buyer form, shipping selection, payment sub-state, exchange rate, and the
//! processing flag. The session lives for exactly one open/close cycle and
//! is reset on close and after a successful commit.
//!
//! Steps run `Info -> Shipping -> Summary -> Payment`; the payment step
//! nests its own `MethodSelect <-> MethodDetail` machine. Both are tagged
//! unions, so states like "in Info with a payment method open" cannot be
//! represented at all.
//!
//! The two asynchronous operations (settlement, rate refresh) and the
//! copied-flag expiry are tokio tasks. Each captures the session's
//! generation counter and discards its effect if the session was reset
//! before the timer fired, so nothing ever writes into a fresh session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use emberline_core::ProductId;
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::cart::{self, Cart, CartLine};
use crate::config::CheckoutConfig;
use crate::error::CheckoutError;
use crate::oracle::{self, ExchangeRate, RateSource, SimulatedRateSource};
use crate::payment::{self, ManualMethod, MethodKind, PaymentMethod, PaymentProof};
use crate::shipping::{self, ShippingOption};
use crate::validate::{self, BuyerInfo, Field, ValidationErrors};
use crate::view::CheckoutView;

/// A wizard step without sub-state, for ordering and stepper display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepId {
    Info,
    Shipping,
    Summary,
    Payment,
}

impl StepId {
    /// All steps in wizard order.
    pub const ALL: [Self; 4] = [Self::Info, Self::Shipping, Self::Summary, Self::Payment];

    /// Position in the wizard sequence.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Info => 0,
            Self::Shipping => 1,
            Self::Summary => 2,
            Self::Payment => 3,
        }
    }

    /// Stepper label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Info => "Details",
            Self::Shipping => "Shipping",
            Self::Summary => "Review",
            Self::Payment => "Payment",
        }
    }
}

/// The current wizard step, with the payment sub-state nested inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Info,
    Shipping,
    Summary,
    Payment(PaymentStage),
}

impl Step {
    /// This step without its sub-state.
    #[must_use]
    pub const fn id(self) -> StepId {
        match self {
            Self::Info => StepId::Info,
            Self::Shipping => StepId::Shipping,
            Self::Summary => StepId::Summary,
            Self::Payment(_) => StepId::Payment,
        }
    }
}

/// Sub-state of the payment step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentStage {
    /// Choosing between payment methods.
    #[default]
    MethodSelect,
    /// Inside a manual method's transfer-and-prove flow.
    MethodDetail(ManualMethod),
}

/// Signals the engine emits to its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutEvent {
    /// The step or payment sub-state changed.
    StepChanged { from: Step, to: Step },
    /// A payment submission passed its preconditions; settlement started.
    PaymentSubmitted { method: PaymentMethod },
    /// The exchange rate was refreshed.
    RateRefreshed { rate: ExchangeRate },
    /// Settlement completed. Emitted exactly once per settled submission,
    /// after the session has been reset. The host should clear the cart and
    /// show its confirmation.
    CommitSuccess,
    /// The session was dismissed; state was already reset when this fires.
    Closed,
}

/// The mutable session aggregate. Exclusive mutation rights belong to the
/// owning [`Checkout`]; timer tasks go through the same mutex and check
/// `generation` before touching anything.
#[derive(Debug)]
struct Session {
    step: Step,
    buyer: BuyerInfo,
    errors: ValidationErrors,
    shipping_id: &'static str,
    proof: Option<PaymentProof>,
    rate: ExchangeRate,
    refreshing: bool,
    processing: bool,
    copied: bool,
    copy_seq: u64,
    /// Bumped on every reset; in-flight timers compare against the value
    /// they captured and discard their result on mismatch.
    generation: u64,
    initial_rate: Decimal,
}

impl Session {
    fn new(initial_rate: Decimal) -> Self {
        Self {
            step: Step::Info,
            buyer: BuyerInfo::default(),
            errors: ValidationErrors::default(),
            shipping_id: shipping::default_option().id,
            proof: None,
            rate: ExchangeRate::now(initial_rate),
            refreshing: false,
            processing: false,
            copied: false,
            copy_seq: 0,
            generation: 0,
            initial_rate,
        }
    }

    /// Restore construction defaults. Idempotent; releases the proof
    /// attachment and invalidates every pending timer.
    fn reset(&mut self) {
        self.step = Step::Info;
        self.buyer = BuyerInfo::default();
        self.errors = ValidationErrors::default();
        self.shipping_id = shipping::default_option().id;
        self.proof = None;
        self.rate = ExchangeRate::now(self.initial_rate);
        self.refreshing = false;
        self.processing = false;
        self.copied = false;
        self.generation += 1;
    }

    fn selected_shipping(&self) -> &'static ShippingOption {
        shipping::get(self.shipping_id).unwrap_or_else(shipping::default_option)
    }
}

/// Handle to one checkout session.
///
/// Cheap to clone; all clones share the same session. Constructed with
/// [`Checkout::open`], which also returns the event receiver.
#[derive(Clone)]
pub struct Checkout {
    session: Arc<Mutex<Session>>,
    cart: Arc<dyn Cart>,
    rates: Arc<dyn RateSource>,
    events: mpsc::UnboundedSender<CheckoutEvent>,
    config: CheckoutConfig,
}

impl Checkout {
    /// Open a checkout session over the host's cart, using the simulated
    /// rate source derived from the config.
    #[must_use]
    pub fn open(
        cart: Arc<dyn Cart>,
        config: CheckoutConfig,
    ) -> (Self, mpsc::UnboundedReceiver<CheckoutEvent>) {
        let rates = Arc::new(SimulatedRateSource::new(
            config.initial_rate,
            config.rate_jitter,
        ));
        Self::open_with_rate_source(cart, rates, config)
    }

    /// Open a checkout session with an explicit rate source.
    #[must_use]
    pub fn open_with_rate_source(
        cart: Arc<dyn Cart>,
        rates: Arc<dyn RateSource>,
        config: CheckoutConfig,
    ) -> (Self, mpsc::UnboundedReceiver<CheckoutEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let checkout = Self {
            session: Arc::new(Mutex::new(Session::new(config.initial_rate))),
            cart,
            rates,
            events,
            config,
        };
        (checkout, receiver)
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Event sends are best-effort: a host that dropped the receiver still
    /// gets a consistent session.
    fn emit(&self, event: CheckoutEvent) {
        let _ = self.events.send(event);
    }

    // =========================================================================
    // Step transitions
    // =========================================================================

    /// Move to the next step. From `Info` this re-validates the buyer form
    /// and refuses (recording field errors) when it fails; `Payment` has no
    /// next step, payment advances via submission instead.
    ///
    /// # Errors
    ///
    /// `Validation` from `Info` with an invalid form, `InvalidStep` from
    /// `Payment`, `Processing` while a settlement is in flight.
    pub fn advance(&self) -> Result<Step, CheckoutError> {
        let (from, to) = {
            let mut session = self.lock();
            if session.processing {
                return Err(CheckoutError::Processing);
            }
            let to = match session.step {
                Step::Info => {
                    let errors = validate::validate(&session.buyer);
                    if errors.is_empty() {
                        session.errors = ValidationErrors::default();
                        Step::Shipping
                    } else {
                        session.errors = errors.clone();
                        return Err(CheckoutError::Validation(errors));
                    }
                }
                Step::Shipping => Step::Summary,
                Step::Summary => Step::Payment(PaymentStage::MethodSelect),
                Step::Payment(_) => return Err(CheckoutError::InvalidStep),
            };
            let from = session.step;
            session.step = to;
            (from, to)
        };
        debug!(?from, ?to, "step advanced");
        self.emit(CheckoutEvent::StepChanged { from, to });
        Ok(to)
    }

    /// Move to the immediately preceding step. A no-op at `Info`. Leaving
    /// the payment step drops its sub-state, so re-entry starts at method
    /// selection.
    ///
    /// # Errors
    ///
    /// `Processing` while a settlement is in flight.
    pub fn retreat(&self) -> Result<Step, CheckoutError> {
        let Some((from, to)) = ({
            let mut session = self.lock();
            if session.processing {
                return Err(CheckoutError::Processing);
            }
            let to = match session.step {
                Step::Info => None,
                Step::Shipping => Some(Step::Info),
                Step::Summary => Some(Step::Shipping),
                Step::Payment(_) => {
                    session.copied = false;
                    Some(Step::Summary)
                }
            };
            to.map(|to| {
                let from = session.step;
                session.step = to;
                (from, to)
            })
        }) else {
            return Ok(Step::Info);
        };
        debug!(?from, ?to, "step retreated");
        self.emit(CheckoutEvent::StepChanged { from, to });
        Ok(to)
    }

    /// Jump directly to a completed (strictly earlier) step, as from the
    /// stepper header.
    ///
    /// # Errors
    ///
    /// `InvalidStep` when the target is the current step or ahead of it,
    /// `Processing` while a settlement is in flight.
    pub fn jump_back(&self, target: StepId) -> Result<Step, CheckoutError> {
        let (from, to) = {
            let mut session = self.lock();
            if session.processing {
                return Err(CheckoutError::Processing);
            }
            if target.index() >= session.step.id().index() {
                return Err(CheckoutError::InvalidStep);
            }
            let to = match target {
                StepId::Info => Step::Info,
                StepId::Shipping => Step::Shipping,
                StepId::Summary => Step::Summary,
                StepId::Payment => Step::Payment(PaymentStage::MethodSelect),
            };
            let from = session.step;
            session.step = to;
            session.copied = false;
            (from, to)
        };
        debug!(?from, ?to, "jumped to completed step");
        self.emit(CheckoutEvent::StepChanged { from, to });
        Ok(to)
    }

    // =========================================================================
    // Buyer form
    // =========================================================================

    /// Edit the name field; clears its stale validation error.
    pub fn set_name(&self, value: impl Into<String>) {
        let mut session = self.lock();
        session.buyer.name = value.into();
        session.errors.clear(Field::Name);
    }

    /// Edit the email field; clears its stale validation error.
    pub fn set_email(&self, value: impl Into<String>) {
        let mut session = self.lock();
        session.buyer.email = value.into();
        session.errors.clear(Field::Email);
    }

    /// Edit the address field; clears its stale validation error.
    pub fn set_address(&self, value: impl Into<String>) {
        let mut session = self.lock();
        session.buyer.address = value.into();
        session.errors.clear(Field::Address);
    }

    // =========================================================================
    // Shipping and totals
    // =========================================================================

    /// Select a shipping option by id. Unknown ids are ignored with a
    /// warning; the previous (always valid) selection stays.
    pub fn select_shipping(&self, id: &str) {
        match shipping::get(id) {
            Some(option) => {
                self.lock().shipping_id = option.id;
                debug!(shipping = option.id, "shipping selected");
            }
            None => warn!(shipping = id, "unknown shipping option ignored"),
        }
    }

    /// Cart subtotal before shipping.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        cart::subtotal(&self.cart.lines())
    }

    /// Order total: subtotal plus selected shipping, at currency scale.
    #[must_use]
    pub fn total(&self) -> Decimal {
        shipping::total_with_shipping(self.subtotal(), self.selected_shipping())
    }

    /// One of four equal interest-free payments of the current total.
    #[must_use]
    pub fn installment_amount(&self) -> Decimal {
        payment::installment_amount(self.total())
    }

    /// The current total converted at the session's exchange rate.
    #[must_use]
    pub fn crypto_amount(&self) -> Decimal {
        oracle::convert(self.total(), self.exchange_rate().value)
    }

    // =========================================================================
    // Cart delegation
    // =========================================================================

    /// Snapshot of the host cart's lines.
    #[must_use]
    pub fn cart_lines(&self) -> Vec<CartLine> {
        self.cart.lines()
    }

    /// Delegate a quantity edit back to the cart owner. Zero removes.
    pub fn set_line_quantity(&self, product_id: ProductId, quantity: u32) {
        self.cart.set_quantity(product_id, quantity);
    }

    // =========================================================================
    // Payment
    // =========================================================================

    /// Choose a payment method on the method-select screen. Immediate
    /// methods submit directly; manual methods open their detail sub-flow.
    /// With nothing in the cart every method is refused, manual ones
    /// included.
    ///
    /// # Errors
    ///
    /// `InvalidStep` outside `Payment/MethodSelect`, `Processing` while a
    /// settlement is in flight, `EmptyCart` with nothing to pay for, plus
    /// any [`Self::submit_payment`] error for immediate methods.
    pub fn select_payment_method(&self, method: PaymentMethod) -> Result<(), CheckoutError> {
        {
            let mut session = self.lock();
            if session.processing {
                return Err(CheckoutError::Processing);
            }
            if session.step != Step::Payment(PaymentStage::MethodSelect) {
                return Err(CheckoutError::InvalidStep);
            }
            if self.cart.lines().is_empty() {
                return Err(CheckoutError::EmptyCart);
            }
            if let Some(manual) = method.manual() {
                let from = session.step;
                let to = Step::Payment(PaymentStage::MethodDetail(manual));
                session.step = to;
                drop(session);
                debug!(?method, "opened manual method detail");
                self.emit(CheckoutEvent::StepChanged { from, to });
                return Ok(());
            }
        }
        self.submit_payment(method)
    }

    /// Explicit back action from a manual method's detail screen.
    ///
    /// # Errors
    ///
    /// `InvalidStep` unless in `Payment/MethodDetail`, `Processing` while a
    /// settlement is in flight.
    pub fn leave_method_detail(&self) -> Result<(), CheckoutError> {
        let (from, to) = {
            let mut session = self.lock();
            if session.processing {
                return Err(CheckoutError::Processing);
            }
            if !matches!(session.step, Step::Payment(PaymentStage::MethodDetail(_))) {
                return Err(CheckoutError::InvalidStep);
            }
            let from = session.step;
            let to = Step::Payment(PaymentStage::MethodSelect);
            session.step = to;
            session.copied = false;
            (from, to)
        };
        self.emit(CheckoutEvent::StepChanged { from, to });
        Ok(())
    }

    /// Submit the payment and start the simulated settlement.
    ///
    /// On success `processing` is set immediately and a settlement task is
    /// scheduled; when the delay elapses the session resets and
    /// [`CheckoutEvent::CommitSuccess`] fires exactly once. At most one
    /// commit proceeds per session: re-entrant submission is rejected.
    ///
    /// # Errors
    ///
    /// `InvalidStep` outside the payment step, `Processing` on re-entrant
    /// submission, `EmptyCart` with nothing to pay for, `MissingProof` for
    /// a manual method without an attachment.
    #[instrument(skip(self))]
    pub fn submit_payment(&self, method: PaymentMethod) -> Result<(), CheckoutError> {
        let generation = {
            let mut session = self.lock();
            if !matches!(session.step, Step::Payment(_)) {
                return Err(CheckoutError::InvalidStep);
            }
            if session.processing {
                return Err(CheckoutError::Processing);
            }
            if self.cart.lines().is_empty() {
                return Err(CheckoutError::EmptyCart);
            }
            if method.kind() == MethodKind::Manual && session.proof.is_none() {
                return Err(CheckoutError::MissingProof);
            }
            session.processing = true;
            session.generation
        };
        info!(?method, "payment submitted, settlement pending");
        self.emit(CheckoutEvent::PaymentSubmitted { method });

        let session = Arc::clone(&self.session);
        let events = self.events.clone();
        let delay = self.config.settlement_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut session = session.lock().unwrap_or_else(PoisonError::into_inner);
            if session.generation != generation {
                debug!("settlement result discarded; session was reset");
                return;
            }
            session.reset();
            drop(session);
            info!("settlement complete");
            let _ = events.send(CheckoutEvent::CommitSuccess);
        });
        Ok(())
    }

    /// Attach (or replace) the proof-of-payment file.
    ///
    /// # Errors
    ///
    /// `Processing` while a settlement is in flight.
    pub fn attach_proof(&self, proof: PaymentProof) -> Result<(), CheckoutError> {
        let mut session = self.lock();
        if session.processing {
            return Err(CheckoutError::Processing);
        }
        debug!(filename = %proof.filename, "payment proof attached");
        session.proof = Some(proof);
        Ok(())
    }

    /// Remove the proof-of-payment file, releasing the attachment.
    ///
    /// # Errors
    ///
    /// `Processing` while a settlement is in flight.
    pub fn remove_proof(&self) -> Result<(), CheckoutError> {
        let mut session = self.lock();
        if session.processing {
            return Err(CheckoutError::Processing);
        }
        session.proof = None;
        Ok(())
    }

    /// Copy the current method's address or number. Returns the text for
    /// the host to place on the clipboard and raises the copied flag, which
    /// a timer lowers again after the configured confirmation window; a
    /// second copy restarts the window.
    ///
    /// # Errors
    ///
    /// `InvalidStep` unless a manual method's detail screen is open.
    pub fn copy_address(&self) -> Result<String, CheckoutError> {
        let (text, generation, seq) = {
            let mut session = self.lock();
            let Step::Payment(PaymentStage::MethodDetail(manual)) = session.step else {
                return Err(CheckoutError::InvalidStep);
            };
            let text = match manual {
                ManualMethod::Crypto => self.config.wallet_address.clone(),
                ManualMethod::Swish => self.config.transfer_number.clone(),
            };
            session.copied = true;
            session.copy_seq += 1;
            (text, session.generation, session.copy_seq)
        };

        let session = Arc::clone(&self.session);
        let window = self.config.copy_confirmation;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let mut session = session.lock().unwrap_or_else(PoisonError::into_inner);
            // Only the latest copy's timer lowers the flag.
            if session.generation == generation && session.copy_seq == seq {
                session.copied = false;
            }
        });
        Ok(text)
    }

    // =========================================================================
    // Exchange rate
    // =========================================================================

    /// Refresh the exchange rate through the rate source. Single-flight:
    /// returns `false` (a no-op) while a refresh is already pending. An
    /// unavailable source leaves the previous rate in place.
    #[instrument(skip(self))]
    pub fn refresh_rate(&self) -> bool {
        let generation = {
            let mut session = self.lock();
            if session.refreshing {
                debug!("rate refresh already in flight");
                return false;
            }
            session.refreshing = true;
            session.generation
        };

        let session = Arc::clone(&self.session);
        let rates = Arc::clone(&self.rates);
        let events = self.events.clone();
        let latency = self.config.oracle_latency;
        tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            let quote = rates.quote();
            let mut session = session.lock().unwrap_or_else(PoisonError::into_inner);
            if session.generation != generation {
                debug!("rate refresh discarded; session was reset");
                return;
            }
            session.refreshing = false;
            match quote {
                Some(value) => {
                    let rate = ExchangeRate::now(value);
                    session.rate = rate;
                    drop(session);
                    debug!(%value, "exchange rate refreshed");
                    let _ = events.send(CheckoutEvent::RateRefreshed { rate });
                }
                None => warn!("rate source unavailable, keeping previous rate"),
            }
        });
        true
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Restore construction defaults. Idempotent; safe at any time. Pending
    /// settlement, refresh, and copy timers are invalidated.
    pub fn reset(&self) {
        self.lock().reset();
    }

    /// Dismiss the session: reset, then signal the host. State is already
    /// back at its defaults when [`CheckoutEvent::Closed`] is observed.
    #[instrument(skip(self))]
    pub fn close(&self) {
        self.reset();
        info!("checkout closed");
        self.emit(CheckoutEvent::Closed);
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The current step, including payment sub-state.
    #[must_use]
    pub fn step(&self) -> Step {
        self.lock().step
    }

    /// A copy of the buyer form.
    #[must_use]
    pub fn buyer(&self) -> BuyerInfo {
        self.lock().buyer.clone()
    }

    /// The current field-level validation messages.
    #[must_use]
    pub fn validation_errors(&self) -> ValidationErrors {
        self.lock().errors.clone()
    }

    /// The currently selected shipping option.
    #[must_use]
    pub fn selected_shipping(&self) -> &'static ShippingOption {
        self.lock().selected_shipping()
    }

    /// The session's exchange rate.
    #[must_use]
    pub fn exchange_rate(&self) -> ExchangeRate {
        self.lock().rate
    }

    /// Whether a rate refresh is pending.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.lock().refreshing
    }

    /// Whether a settlement is in flight.
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.lock().processing
    }

    /// Whether the copied confirmation is currently shown.
    #[must_use]
    pub fn address_copied(&self) -> bool {
        self.lock().copied
    }

    /// Filename of the attached proof, if any.
    #[must_use]
    pub fn proof_filename(&self) -> Option<String> {
        self.lock().proof.as_ref().map(|p| p.filename.clone())
    }

    /// Whether a submission for `method` would currently be accepted.
    #[must_use]
    pub fn can_submit(&self, method: PaymentMethod) -> bool {
        let session = self.lock();
        if session.processing || self.cart.lines().is_empty() {
            return false;
        }
        method.kind() == MethodKind::Immediate || session.proof.is_some()
    }

    /// The engine configuration.
    #[must_use]
    pub const fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// A render snapshot of the whole session.
    #[must_use]
    pub fn view(&self) -> CheckoutView {
        CheckoutView::capture(self)
    }
}
