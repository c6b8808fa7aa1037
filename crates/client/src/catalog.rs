//! Product catalog lookups for the cart.

use std::path::Path;

use paratha_core::{CategoryId, Price, ProductId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Retail unit price.
    pub price: Price,
    /// Discounted unit price for bulk buyers.
    #[serde(default, alias = "businessPrice")]
    pub bulk_price: Option<Price>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default = "available")]
    pub is_available: bool,
}

const fn available() -> bool {
    true
}

impl Product {
    /// Unit price charged to a buyer.
    #[must_use]
    pub fn unit_price(&self, bulk_buyer: bool) -> Price {
        if bulk_buyer {
            self.bulk_price.unwrap_or(self.price)
        } else {
            self.price
        }
    }
}

/// Read-only product lookup.
pub trait Catalog: Send + Sync {
    /// Find a product by id.
    fn find_product(&self, id: &ProductId) -> Option<Product>;

    /// Every product, in menu order.
    fn list_products(&self) -> Vec<Product>;
}

/// Errors loading a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid catalog file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Catalog held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    products: Vec<Product>,
}

impl StaticCatalog {
    #[must_use]
    pub const fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// The menu shipped with the app.
    #[must_use]
    pub fn builtin() -> Self {
        let product = |id: &str, name: &str, description: &str, cents: i64, image: &str| Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            description: description.to_owned(),
            price: Price::from_cents(cents),
            bulk_price: None,
            image: image.to_owned(),
            category_id: Some(CategoryId::new(id)),
            is_available: true,
        };

        Self::new(vec![
            product(
                "1",
                "Malabar Paratha",
                "Layered Kerala-style paratha made by trained chefs from our own dough recipe.",
                899,
                "https://goodhealthy.co.in/wp-content/uploads/2023/11/New-GHMP-Front.png",
            ),
            product(
                "2",
                "Wheat Paratha",
                "Whole wheat parotta in the Kerala tradition, for breakfast, lunch or dinner.",
                1199,
                "https://goodhealthy.co.in/wp-content/uploads/2024/01/CH-Wheat-Paratha-Front-5pcs-1.png",
            ),
            product(
                "3",
                "Puri",
                "Deep-fried whole wheat puri, crisp outside and soft inside.",
                1299,
                "https://goodhealthy.co.in/wp-content/uploads/2024/06/GH-Puri-Front-Mockup-1.png",
            ),
            product(
                "4",
                "Wheat Chapati",
                "The everyday chapati, ready without kneading dough or standing at the stove.",
                1499,
                "https://goodhealthy.co.in/wp-content/uploads/2024/01/CH-Wheat-Chapati-Front-1.png",
            ),
        ])
    }

    /// Load a catalog from a JSON array of products.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the file cannot be read or parsed.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        let products: Vec<Product> = serde_json::from_slice(&bytes)?;
        tracing::debug!(count = products.len(), path = %path.as_ref().display(), "Loaded catalog");
        Ok(Self::new(products))
    }

    /// All products in menu order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }
}

impl Catalog for StaticCatalog {
    fn find_product(&self, id: &ProductId) -> Option<Product> {
        self.products.iter().find(|p| &p.id == id).cloned()
    }

    fn list_products(&self) -> Vec<Product> {
        self.products.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_menu() {
        let catalog = StaticCatalog::builtin();
        assert_eq!(catalog.products().len(), 4);

        let malabar = catalog.find_product(&ProductId::new("1")).unwrap();
        assert_eq!(malabar.name, "Malabar Paratha");
        assert_eq!(malabar.price, Price::from_cents(899));
        assert!(catalog.find_product(&ProductId::new("99")).is_none());
    }

    #[test]
    fn test_bulk_price_aliases_and_fallback() {
        let product: Product = serde_json::from_value(json!({
            "id": "7",
            "name": "Kerala Paratha Pack",
            "price": 150,
            "businessPrice": "120"
        }))
        .unwrap();
        assert_eq!(product.unit_price(true), Price::from_cents(12_000));
        assert_eq!(product.unit_price(false), Price::from_cents(15_000));
        assert!(product.is_available);

        let plain = Product {
            bulk_price: None,
            ..product
        };
        assert_eq!(plain.unit_price(true), Price::from_cents(15_000));
    }

    #[tokio::test]
    async fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("menu.json");
        std::fs::write(
            &path,
            serde_json::to_vec(&json!([
                { "id": "a", "name": "Aloo Paratha", "price": 4.5, "bulkPrice": 4.0 }
            ]))
            .unwrap(),
        )
        .unwrap();

        let catalog = StaticCatalog::from_json_file(&path).await.unwrap();
        let product = catalog.find_product(&ProductId::new("a")).unwrap();
        assert_eq!(product.bulk_price, Some(Price::from_cents(400)));

        assert!(matches!(
            StaticCatalog::from_json_file(dir.path().join("missing.json")).await,
            Err(CatalogError::Io(_))
        ));
    }
}
