//! Typed wrappers for the backend endpoints.

use reqwest::Method;
use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{instrument, warn};

use styleaura_core::ProductId;

use super::ApiClient;
use crate::error::Result;
use crate::models::{AuthResponse, CartItem, NewProduct, Product, Review};

/// Body of `POST /Auth/register`.
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    #[serde(rename = "firstName")]
    pub first_name: &'a str,
    #[serde(rename = "lastName")]
    pub last_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

impl ApiClient {
    // =========================================================================
    // Auth
    // =========================================================================

    /// `POST /Auth/login`.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Auth` with the server message when the
    /// credentials are rejected, or any transport/decoding error.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let body = json!({ "email": email, "password": password });
        self.fetch(Method::POST, "/Auth/login", None, Some(&body))
            .await
    }

    /// `POST /Auth/register`.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error (typically `Validation` for an
    /// already-registered email).
    #[instrument(skip_all, fields(email = request.email))]
    pub async fn register(&self, request: &RegisterRequest<'_>) -> Result<AuthResponse> {
        let body = serde_json::to_value(request)?;
        self.fetch(Method::POST, "/Auth/register", None, Some(&body))
            .await
    }

    /// `POST /GoogleAuth/login` with a Google ID token.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error.
    #[instrument(skip_all)]
    pub async fn google_login(&self, id_token: &str) -> Result<AuthResponse> {
        let body = json!({ "idToken": id_token });
        self.fetch(Method::POST, "/GoogleAuth/login", None, Some(&body))
            .await
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// `GET /Products/`.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error after the retry budget is spent.
    pub async fn products(&self) -> Result<Vec<Product>> {
        self.get_with_retry("/Products/", None).await
    }

    /// `GET /Products/search?query=`.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error after the retry budget is spent.
    pub async fn search_products(&self, query: &str) -> Result<Vec<Product>> {
        let path = format!("/Products/search?query={}", urlencoding::encode(query));
        self.get_with_retry(&path, None).await
    }

    /// `GET /Products/{id}`.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::NotFound` for an unknown product.
    pub async fn product(&self, id: ProductId) -> Result<Product> {
        self.get_with_retry(&format!("/Products/{id}"), None).await
    }

    /// `GET /ProductRatings/product/{id}/average`.
    ///
    /// The backend answers with a bare number. Anything else, including a
    /// value outside `[0, 5]`, is reported as "no rating".
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error after the retry budget is spent.
    pub async fn rating_average(&self, id: ProductId) -> Result<Option<f64>> {
        let value: serde_json::Value = self
            .get_with_retry(&format!("/ProductRatings/product/{id}/average"), None)
            .await?;
        Ok(value
            .as_f64()
            .filter(|avg| avg.is_finite() && (0.0..=5.0).contains(avg)))
    }

    /// `GET /ProductRatings/product/{id}`.
    ///
    /// Entries that do not decode as a review (e.g. a rating outside 1..=5)
    /// are skipped.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error after the retry budget is spent.
    pub async fn reviews(&self, id: ProductId) -> Result<Vec<Review>> {
        let raw: Vec<serde_json::Value> = self
            .get_with_retry(&format!("/ProductRatings/product/{id}"), None)
            .await?;
        Ok(raw
            .into_iter()
            .filter_map(|entry| {
                serde_json::from_value(entry)
                    .map_err(|e| warn!(product_id = %id, error = %e, "Skipping malformed review"))
                    .ok()
            })
            .collect())
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// `GET /Cart/list`.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Auth` when the token is rejected.
    pub async fn cart_list(&self, token: &SecretString) -> Result<Vec<CartItem>> {
        self.get_with_retry("/Cart/list", Some(token)).await
    }

    /// `POST /Cart/add`.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error.
    #[instrument(skip(self, token))]
    pub async fn cart_add(
        &self,
        token: &SecretString,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<()> {
        let body = json!({ "productId": product_id, "quantity": quantity });
        self.execute(Method::POST, "/Cart/add", Some(token), Some(&body))
            .await
    }

    /// `PUT /Cart/{id}` setting the absolute quantity.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error.
    #[instrument(skip(self, token))]
    pub async fn cart_update(
        &self,
        token: &SecretString,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<()> {
        let body = json!({ "quantity": quantity });
        self.execute(
            Method::PUT,
            &format!("/Cart/{product_id}"),
            Some(token),
            Some(&body),
        )
        .await
    }

    /// `DELETE /Cart/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error.
    #[instrument(skip(self, token))]
    pub async fn cart_remove(&self, token: &SecretString, product_id: ProductId) -> Result<()> {
        self.execute(
            Method::DELETE,
            &format!("/Cart/{product_id}"),
            Some(token),
            None,
        )
        .await
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// `GET /Admin/{resource}`.
    ///
    /// A body that is not a JSON array is treated as an empty listing.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Auth` for non-admin tokens, or `Validation`
    /// if an entry does not decode as `T`.
    pub async fn admin_list<T: DeserializeOwned>(
        &self,
        token: &SecretString,
        resource: &str,
    ) -> Result<Vec<T>> {
        let path = format!("/Admin/{}", urlencoding::encode(resource));
        match self
            .get_with_retry::<serde_json::Value>(&path, Some(token))
            .await?
        {
            value @ serde_json::Value::Array(_) => Ok(serde_json::from_value(value)?),
            other => {
                warn!(resource, kind = json_kind(&other), "Admin listing is not an array");
                Ok(Vec::new())
            }
        }
    }

    /// `POST /Products/AddProducts`.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error.
    #[instrument(skip(self, token, product), fields(name = %product.name))]
    pub async fn add_product(&self, token: &SecretString, product: &NewProduct) -> Result<()> {
        let body = serde_json::to_value(product)?;
        self.execute(Method::POST, "/Products/AddProducts", Some(token), Some(&body))
            .await
    }

    /// `DELETE /Products/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error.
    #[instrument(skip(self, token))]
    pub async fn delete_product(&self, token: &SecretString, product_id: ProductId) -> Result<()> {
        self.execute(
            Method::DELETE,
            &format!("/Products/{product_id}"),
            Some(token),
            None,
        )
        .await
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
