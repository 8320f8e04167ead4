//! Buyer information validation.
//!
//! Validation is a pure function over the form; it is re-run fresh on every
//! attempt to leave the info step. Stale field errors are cleared by the
//! session as soon as the corresponding field is edited.

use emberline_core::Email;
use serde::{Deserialize, Serialize};

/// The guest-information form: all free text until validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerInfo {
    pub name: String,
    pub email: String,
    pub address: String,
}

/// A buyer-info form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Address,
}

/// Field-level validation messages. Empty means the form passed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl ValidationErrors {
    /// True when no field has an error.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.address.is_none()
    }

    /// Clear the error for one field, leaving the others in place.
    pub fn clear(&mut self, field: Field) {
        match field {
            Field::Name => self.name = None,
            Field::Email => self.email = None,
            Field::Address => self.address = None,
        }
    }
}

/// Validate the buyer form, returning the full error set.
#[must_use]
pub fn validate(info: &BuyerInfo) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    if info.name.trim().is_empty() {
        errors.name = Some("Full name is required.".to_string());
    }

    let email = info.email.trim();
    if email.is_empty() {
        errors.email = Some("Email is required.".to_string());
    } else if Email::parse(email).is_err() {
        errors.email = Some("Email is invalid.".to_string());
    }

    if info.address.trim().is_empty() {
        errors.address = Some("Shipping address is required.".to_string());
    }

    errors
}
