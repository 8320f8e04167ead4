//! Emberline Core - Shared types library.
//!
//! This crate provides common types used across all Emberline components:
//! - `checkout` - The checkout workflow engine
//! - `integration-tests` - End-to-end wizard tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no async runtime, no
//! clocks. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, and emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
