//! Emberline Checkout - the checkout workflow engine.
//!
//! A multi-step checkout wizard as a state machine: buyer info, shipping
//! choice, order review, and payment, with a nested payment sub-state machine
//! for methods that need their own flow (crypto, Swish). Settlement and the
//! exchange-rate refresh are the only asynchronous operations; both run as
//! tokio tasks whose results are discarded if the session was reset in the
//! meantime.
//!
//! The engine has no network, file-system, or CLI surface. It consumes a
//! [`cart::Cart`] collaborator and emits [`session::CheckoutEvent`]s; hosts
//! render from the [`view::CheckoutView`] snapshot.
//!
//! # Modules
//!
//! - [`session`] - The [`session::Checkout`] handle and step state machine
//! - [`cart`] - Cart collaborator trait and in-memory implementation
//! - [`validate`] - Buyer-info validation
//! - [`shipping`] - Static shipping catalog
//! - [`oracle`] - Simulated exchange-rate feed
//! - [`payment`] - Payment methods and proof attachments
//! - [`view`] - Render snapshots for presentation shells
//! - [`config`] - Engine configuration
//! - [`error`] - Error taxonomy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod error;
pub mod oracle;
pub mod payment;
pub mod session;
pub mod shipping;
pub mod validate;
pub mod view;

pub use cart::{Cart, CartLine, InMemoryCart};
pub use config::{CheckoutConfig, ConfigError};
pub use error::CheckoutError;
pub use oracle::{ExchangeRate, RateSource, SimulatedRateSource};
pub use payment::{ManualMethod, MethodKind, PaymentMethod, PaymentProof};
pub use session::{Checkout, CheckoutEvent, PaymentStage, Step, StepId};
pub use validate::{BuyerInfo, ValidationErrors};
pub use view::CheckoutView;
