//! Catalog, review and admin types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use styleaura_core::{CategoryId, ListedPrice, ProductId, RatingValue, ReviewId, UserId};

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "productID", alias = "productId", alias = "id")]
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: ListedPrice,
    #[serde(rename = "imageURL", alias = "imageUrl", default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(rename = "stockQuantity", default)]
    pub stock_quantity: i64,
    #[serde(rename = "categoryID", alias = "categoryId", default)]
    pub category_id: Option<CategoryId>,
}

/// A single product review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "ratingId", alias = "ratingID", alias = "id")]
    pub id: ReviewId,
    #[serde(rename = "productID", alias = "productId", default)]
    pub product_id: Option<ProductId>,
    #[serde(rename = "userId", alias = "userID", default)]
    pub user_id: Option<UserId>,
    #[serde(rename = "userName", alias = "username", default)]
    pub user_name: Option<String>,
    #[serde(rename = "ratingValue")]
    pub rating_value: RatingValue,
    #[serde(rename = "reviewText", alias = "text", default)]
    pub text: String,
}

impl Review {
    /// Name shown above the review text.
    #[must_use]
    pub fn author_label(&self) -> String {
        match (&self.user_name, self.user_id) {
            (Some(name), _) if !name.trim().is_empty() => name.clone(),
            (_, Some(id)) => format!("User {id}"),
            _ => "Anonymous".to_string(),
        }
    }
}

/// Payload for `POST /Products/AddProducts`.
#[derive(Debug, Clone, Serialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    #[serde(rename = "stockQuantity")]
    pub stock_quantity: i64,
    #[serde(rename = "categoryID")]
    pub category_id: CategoryId,
}

/// Row of `GET /Admin/users`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdminUser {
    #[serde(rename = "userID", alias = "userId", alias = "id")]
    pub id: UserId,
    #[serde(rename = "firstName", default)]
    pub first_name: String,
    #[serde(rename = "lastName", default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}
