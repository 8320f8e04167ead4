//! Cart collaborator interface.
//!
//! The cart is owned by the host, not the checkout engine. The engine holds
//! a read reference plus a mutation capability; quantity edits made on the
//! order-review step are delegated back through [`Cart::set_quantity`].

use std::sync::{Mutex, PoisonError};

use emberline_core::ProductId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One product entry with quantity in the buyer's order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub title: String,
    /// Unit price in the store currency's standard unit.
    pub unit_price: Decimal,
    pub quantity: u32,
    pub image_url: Option<String>,
}

impl CartLine {
    /// The extended price of this line (unit price times quantity).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Sum of all line totals, before shipping.
#[must_use]
pub fn subtotal(lines: &[CartLine]) -> Decimal {
    lines.iter().map(CartLine::line_total).sum()
}

/// Read and mutation capabilities the checkout engine needs from the
/// host-owned cart.
pub trait Cart: Send + Sync {
    /// The current ordered line list.
    fn lines(&self) -> Vec<CartLine>;

    /// Set a line's quantity. A quantity of zero removes the line.
    fn set_quantity(&self, product_id: ProductId, quantity: u32);

    /// Remove every line.
    fn clear(&self);
}

/// A simple process-local cart, suitable for hosts and tests.
#[derive(Debug, Default)]
pub struct InMemoryCart {
    lines: Mutex<Vec<CartLine>>,
}

impl InMemoryCart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a line, merging quantities when the product is already present.
    pub fn add(&self, line: CartLine) {
        let mut lines = self.lock();
        if let Some(existing) = lines
            .iter_mut()
            .find(|l| l.product_id == line.product_id)
        {
            existing.quantity += line.quantity;
        } else {
            lines.push(line);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<CartLine>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Cart for InMemoryCart {
    fn lines(&self) -> Vec<CartLine> {
        self.lock().clone()
    }

    fn set_quantity(&self, product_id: ProductId, quantity: u32) {
        let mut lines = self.lock();
        if quantity == 0 {
            lines.retain(|l| l.product_id != product_id);
        } else if let Some(line) = lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = quantity;
        }
    }

    fn clear(&self) {
        self.lock().clear();
    }
}
