//! In-memory shopping cart.
//!
//! The cart is owned by a single screen flow and mutated synchronously. Lines
//! snapshot the product's name, image and unit price when first added; later
//! catalog changes do not reprice them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use paratha_core::{
    BULK_QUANTITY_STEP, LineItemId, OrderTotals, Price, ProductId, normalize_bulk_quantity,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Catalog;

/// Errors from cart mutations. The cart is unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Quantity must be at least 1")]
    InvalidQuantity,
}

/// One cart row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: LineItemId,
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub image: String,
    pub quantity: u32,
    pub is_bulk_item: bool,
    pub added_at: DateTime<Utc>,
}

impl LineItem {
    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }

    /// Increment used by quantity steppers.
    #[must_use]
    pub const fn quantity_step(&self) -> u32 {
        if self.is_bulk_item {
            BULK_QUANTITY_STEP
        } else {
            1
        }
    }
}

/// The cart.
pub struct CartManager {
    catalog: Arc<dyn Catalog>,
    items: Vec<LineItem>,
}

impl std::fmt::Debug for CartManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartManager")
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}

impl CartManager {
    /// Create an empty cart backed by `catalog`.
    #[must_use]
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            items: Vec::new(),
        }
    }

    /// Catalog the cart prices from.
    #[must_use]
    pub fn catalog(&self) -> &dyn Catalog {
        self.catalog.as_ref()
    }

    /// Add `quantity` units of a product.
    ///
    /// Bulk buyers are rounded up to a multiple of [`BULK_QUANTITY_STEP`] and
    /// charged the product's bulk price when it has one. Adding a product
    /// already in the cart merges into its line at the original price.
    ///
    /// # Errors
    ///
    /// - `ProductNotFound` if the catalog has no such product
    /// - `InvalidQuantity` for a standard add of zero units
    pub fn add_item(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
        bulk_buyer: bool,
    ) -> Result<&LineItem, CartError> {
        let product = self
            .catalog
            .find_product(product_id)
            .ok_or_else(|| CartError::ProductNotFound(product_id.clone()))?;

        let quantity = if bulk_buyer {
            normalize_bulk_quantity(quantity)
        } else if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        } else {
            quantity
        };

        if let Some(line) = self
            .items
            .iter_mut()
            .find(|line| &line.product_id == product_id)
        {
            line.quantity = line.quantity.saturating_add(quantity);
            tracing::debug!(product_id = %product_id, quantity = line.quantity, "Merged cart line");
        } else {
            self.items.push(LineItem {
                id: LineItemId::generate(),
                product_id: product.id.clone(),
                name: product.name.clone(),
                unit_price: product.unit_price(bulk_buyer),
                image: product.image,
                quantity,
                is_bulk_item: bulk_buyer,
                added_at: Utc::now(),
            });
            tracing::debug!(product_id = %product_id, quantity, bulk_buyer, "Added cart line");
        }

        self.items
            .iter()
            .find(|line| &line.product_id == product_id)
            .ok_or_else(|| CartError::ProductNotFound(product_id.clone()))
    }

    /// Remove a line. Returns `None` if it was not in the cart.
    pub fn remove_item(&mut self, id: &LineItemId) -> Option<LineItem> {
        let index = self.position_of(id)?;
        Some(self.items.remove(index))
    }

    /// Set a line's quantity.
    ///
    /// A quantity of zero or less removes the line. Bulk lines are not
    /// re-rounded. Returns the updated line, or `None` if it was removed or
    /// never existed.
    pub fn update_quantity(&mut self, id: &LineItemId, quantity: i64) -> Option<&LineItem> {
        let quantity = u32::try_from(quantity.clamp(0, i64::from(u32::MAX))).unwrap_or(u32::MAX);
        if quantity == 0 {
            self.remove_item(id);
            return None;
        }

        let line = self.items.iter_mut().find(|line| &line.id == id)?;
        line.quantity = quantity;
        Some(line)
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, id: &LineItemId) -> Option<&LineItem> {
        self.items.iter().find(|line| &line.id == id)
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(LineItem::line_total).sum()
    }

    /// Subtotal plus a flat delivery fee.
    #[must_use]
    pub fn totals(&self, delivery_fee: Price) -> OrderTotals {
        OrderTotals::new(self.subtotal(), delivery_fee)
    }

    fn position_of(&self, id: &LineItemId) -> Option<usize> {
        self.items.iter().position(|line| &line.id == id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::RwLock;

    use super::*;
    use crate::catalog::{Product, StaticCatalog};

    fn product(id: &str, price: i64, bulk_price: Option<i64>) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: String::new(),
            price: Price::from_cents(price * 100),
            bulk_price: bulk_price.map(|p| Price::from_cents(p * 100)),
            image: format!("https://img.example/{id}.png"),
            category_id: None,
            is_available: true,
        }
    }

    fn sample_cart() -> CartManager {
        CartManager::new(Arc::new(StaticCatalog::new(vec![
            product("p1", 150, Some(120)),
            product("p2", 150, None),
        ])))
    }

    #[test]
    fn test_subtotal_uses_snapshot_prices() {
        let mut cart = sample_cart();
        cart.add_item(&ProductId::new("p1"), 2, false).unwrap();
        cart.add_item(&ProductId::new("p2"), 1, false).unwrap();
        assert_eq!(cart.subtotal(), Price::from_cents(45_000));

        let mut bulk = sample_cart();
        let line = bulk.add_item(&ProductId::new("p1"), 1, true).unwrap();
        let id = line.id;
        bulk.update_quantity(&id, 2);
        bulk.add_item(&ProductId::new("p2"), 1, false).unwrap();
        // 120 x 2 + 150 x 1
        assert_eq!(bulk.subtotal(), Price::from_cents(39_000));
        assert_eq!(
            bulk.totals(Price::from_cents(299)).total,
            Price::from_cents(39_299)
        );
    }

    #[test]
    fn test_item_count_vs_line_count() {
        let mut cart = sample_cart();
        cart.add_item(&ProductId::new("p1"), 2, false).unwrap();
        cart.add_item(&ProductId::new("p2"), 1, false).unwrap();
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.line_count(), 2);
    }

    #[test]
    fn test_bulk_quantities_are_normalized() {
        for (requested, expected) in [(1, 50), (73, 100), (150, 150)] {
            let mut cart = sample_cart();
            let line = cart.add_item(&ProductId::new("p1"), requested, true).unwrap();
            assert_eq!(line.quantity, expected);
            assert!(line.is_bulk_item);
            assert_eq!(line.quantity_step(), 50);
            assert_eq!(line.unit_price, Price::from_cents(12_000));
        }
    }

    #[test]
    fn test_bulk_price_falls_back_to_retail() {
        let mut cart = sample_cart();
        let line = cart.add_item(&ProductId::new("p2"), 10, true).unwrap();
        assert_eq!(line.unit_price, Price::from_cents(15_000));
    }

    #[test]
    fn test_repeat_add_merges() {
        let mut cart = sample_cart();
        let first = cart.add_item(&ProductId::new("p1"), 2, false).unwrap().id;
        let merged = cart.add_item(&ProductId::new("p1"), 3, false).unwrap();
        assert_eq!(merged.id, first);
        assert_eq!(merged.quantity, 5);
        assert_eq!(merged.quantity_step(), 1);
        assert_eq!(cart.line_count(), 1);
    }

    #[test]
    fn test_unknown_product_and_zero_quantity_leave_cart_unchanged() {
        let mut cart = sample_cart();
        assert_eq!(
            cart.add_item(&ProductId::new("nope"), 1, false).unwrap_err(),
            CartError::ProductNotFound(ProductId::new("nope"))
        );
        assert_eq!(
            cart.add_item(&ProductId::new("p1"), 0, false).unwrap_err(),
            CartError::InvalidQuantity
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cart = sample_cart();
        let id = cart.add_item(&ProductId::new("p1"), 1, false).unwrap().id;
        cart.add_item(&ProductId::new("p2"), 1, false).unwrap();

        assert!(cart.remove_item(&id).is_some());
        let after_first = cart.items().to_vec();
        assert!(cart.remove_item(&id).is_none());
        assert_eq!(cart.items(), after_first.as_slice());
    }

    #[test]
    fn test_update_quantity_floor_removes_line() {
        let mut cart = sample_cart();
        let a = cart.add_item(&ProductId::new("p1"), 4, false).unwrap().id;
        let b = cart.add_item(&ProductId::new("p2"), 4, false).unwrap().id;

        assert!(cart.update_quantity(&a, 0).is_none());
        assert!(cart.update_quantity(&b, -3).is_none());
        assert!(cart.get(&a).is_none());
        assert!(cart.is_empty());
        assert!(cart.update_quantity(&a, 2).is_none());
    }

    #[test]
    fn test_update_quantity_does_not_renormalize_bulk_lines() {
        let mut cart = sample_cart();
        let id = cart.add_item(&ProductId::new("p1"), 50, true).unwrap().id;
        assert_eq!(cart.update_quantity(&id, 70).unwrap().quantity, 70);
    }

    #[test]
    fn test_lines_keep_price_after_catalog_change() {
        struct Mutable(RwLock<Vec<Product>>);

        impl Catalog for Mutable {
            fn find_product(&self, id: &ProductId) -> Option<Product> {
                self.0.read().unwrap().iter().find(|p| &p.id == id).cloned()
            }

            fn list_products(&self) -> Vec<Product> {
                self.0.read().unwrap().clone()
            }
        }

        let catalog = Arc::new(Mutable(RwLock::new(vec![product("p1", 150, None)])));
        let mut cart = CartManager::new(Arc::clone(&catalog) as Arc<dyn Catalog>);
        cart.add_item(&ProductId::new("p1"), 1, false).unwrap();

        catalog.0.write().unwrap()[0].price = Price::from_cents(99_900);
        let line = cart.add_item(&ProductId::new("p1"), 1, false).unwrap();
        assert_eq!(line.unit_price, Price::from_cents(15_000));
        assert_eq!(cart.subtotal(), Price::from_cents(30_000));
    }

    #[test]
    fn test_clear() {
        let mut cart = sample_cart();
        cart.add_item(&ProductId::new("p1"), 1, false).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
        assert_eq!(cart.subtotal(), Price::ZERO);
    }
}
