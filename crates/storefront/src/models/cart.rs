//! Cart types.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use styleaura_core::{Money, ProductId};

use crate::error::StorefrontError;

/// One line of the server-side cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(rename = "productID", alias = "productId")]
    pub product_id: ProductId,
    #[serde(rename = "productName", alias = "name", default)]
    pub name: String,
    pub price: Money,
    pub quantity: u32,
    #[serde(rename = "productImageUrl", alias = "imageUrl", default)]
    pub image_url: Option<String>,
}

impl CartItem {
    /// `price × quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.price.times(self.quantity)
    }
}

/// The cart mirror: items in the order the server returned them.
///
/// Invariants: every quantity is at least 1 and each product appears at most
/// once. A `Cart` can only be built from a server listing through
/// [`Cart::from_server`], which enforces both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// A cart with no lines.
    #[must_use]
    pub const fn empty() -> Self {
        Self { items: Vec::new() }
    }

    /// Validate a `GET /Cart/list` response.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Validation` if a product is listed twice or a
    /// line has quantity 0.
    pub fn from_server(items: Vec<CartItem>) -> Result<Self, StorefrontError> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if item.quantity == 0 {
                return Err(StorefrontError::Validation(format!(
                    "cart line for product {} has quantity 0",
                    item.product_id
                )));
            }
            if !seen.insert(item.product_id) {
                return Err(StorefrontError::Validation(format!(
                    "product {} appears twice in the cart",
                    item.product_id
                )));
            }
        }
        Ok(Self { items })
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Line for `product_id`, if present.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.get(product_id).is_some()
    }

    /// Quantity held for `product_id`, or 0.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.get(product_id).map_or(0, |item| item.quantity)
    }

    /// Σ price × quantity.
    #[must_use]
    pub fn total(&self) -> Money {
        self.items.iter().map(CartItem::subtotal).sum()
    }

    /// Σ quantity.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: i64, price: &str, quantity: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            name: format!("Item {id}"),
            price: price.parse().unwrap(),
            quantity,
            image_url: None,
        }
    }

    #[test]
    fn test_total_is_sum_of_subtotals() {
        let cart = Cart::from_server(vec![item(1, "199.99", 2), item(2, "0.01", 3)]).unwrap();
        assert_eq!(cart.total().to_string(), "400.01");
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_empty_total_is_zero() {
        assert_eq!(Cart::default().total(), Money::ZERO);
    }

    #[test]
    fn test_rejects_duplicates_and_zero_quantity() {
        assert!(Cart::from_server(vec![item(1, "1", 1), item(1, "1", 2)]).is_err());
        assert!(Cart::from_server(vec![item(1, "1", 0)]).is_err());
    }

    #[test]
    fn test_wire_names() {
        let json = r#"[{"productID":4,"productName":"Linen Shirt","price":1499,"quantity":2,"productImageUrl":"https://img/4.jpg"}]"#;
        let items: Vec<CartItem> = serde_json::from_str(json).unwrap();
        let cart = Cart::from_server(items).unwrap();
        let line = cart.get(ProductId::new(4)).unwrap();
        assert_eq!(line.name, "Linen Shirt");
        assert_eq!(line.image_url.as_deref(), Some("https://img/4.jpg"));
        assert_eq!(cart.total().to_string(), "2998.00");
    }
}
