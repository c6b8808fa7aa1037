//! Pricing rules shared by the cart and checkout screens.

use serde::{Deserialize, Serialize};

use crate::types::Price;

/// Bulk buyers order in multiples of this many units.
pub const BULK_QUANTITY_STEP: u32 = 50;

/// Normalize a bulk buyer's requested quantity.
///
/// Rounds up to the next multiple of [`BULK_QUANTITY_STEP`] with a floor of
/// one step: `1 -> 50`, `73 -> 100`, `150 -> 150`. Saturates at the largest
/// representable multiple.
#[must_use]
pub const fn normalize_bulk_quantity(requested: u32) -> u32 {
    let steps = requested.div_ceil(BULK_QUANTITY_STEP);
    let steps = if steps == 0 { 1 } else { steps };
    match steps.checked_mul(BULK_QUANTITY_STEP) {
        Some(quantity) => quantity,
        None => u32::MAX - u32::MAX % BULK_QUANTITY_STEP,
    }
}

/// Subtotal, delivery fee and grand total of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Price,
    pub delivery_fee: Price,
    pub total: Price,
}

impl OrderTotals {
    /// Compute totals from a subtotal and a flat delivery fee.
    #[must_use]
    pub fn new(subtotal: Price, delivery_fee: Price) -> Self {
        Self {
            subtotal,
            delivery_fee,
            total: subtotal + delivery_fee,
        }
    }
}
