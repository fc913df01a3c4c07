//! Admin endpoints, available to admin sessions only.

use secrecy::SecretString;
use tracing::instrument;

use styleaura_core::ProductId;

use crate::api::ApiClient;
use crate::error::{Result, StorefrontError};
use crate::models::{AdminUser, NewProduct, Product};
use crate::session::SessionStore;

/// Client for the admin screens.
///
/// Every call checks the session first: a missing session fails with
/// `StorefrontError::Auth` and a non-admin user with `Forbidden`, both before
/// any request is made.
#[derive(Debug, Clone)]
pub struct AdminClient {
    api: ApiClient,
    session: SessionStore,
}

impl AdminClient {
    #[must_use]
    pub const fn new(api: ApiClient, session: SessionStore) -> Self {
        Self { api, session }
    }

    fn admin_token(&self) -> Result<SecretString> {
        let session = self.session.snapshot();
        let Some(identity) = session.identity() else {
            return Err(StorefrontError::Auth(Some(
                "Authentication token not found.".to_string(),
            )));
        };
        if !identity.user().is_admin() {
            return Err(StorefrontError::Forbidden(Some(
                "Admin access required.".to_string(),
            )));
        }
        self.session
            .bearer()
            .map(|bearer| bearer.token)
            .ok_or(StorefrontError::Auth(None))
    }

    /// `GET /Admin/users`.
    ///
    /// # Errors
    ///
    /// Returns `Auth` without a session, `Forbidden` for non-admin sessions,
    /// otherwise the backend error.
    #[instrument(skip(self))]
    pub async fn users(&self) -> Result<Vec<AdminUser>> {
        let token = self.admin_token()?;
        self.api.admin_list(&token, "users").await
    }

    /// `GET /Admin/products`.
    ///
    /// # Errors
    ///
    /// Returns `Auth` without a session, `Forbidden` for non-admin sessions,
    /// otherwise the backend error.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>> {
        let token = self.admin_token()?;
        self.api.admin_list(&token, "products").await
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a blank name or negative price/stock, `Auth`
    /// without a session, `Forbidden` for non-admin sessions, otherwise the
    /// backend error.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn add_product(&self, product: &NewProduct) -> Result<()> {
        if product.name.trim().is_empty() {
            return Err(StorefrontError::Validation(
                "Product name is required.".to_string(),
            ));
        }
        if product.price.is_sign_negative() || product.stock_quantity < 0 {
            return Err(StorefrontError::Validation(
                "Price and stock quantity must not be negative.".to_string(),
            ));
        }
        let token = self.admin_token()?;
        self.api.add_product(&token, product).await
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `Auth` without a session, `Forbidden` for non-admin sessions,
    /// otherwise the backend error.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<()> {
        let token = self.admin_token()?;
        self.api.delete_product(&token, id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::StorefrontConfig;
    use crate::models::UserProfile;
    use crate::session::MemoryStorage;

    fn client() -> (AdminClient, SessionStore) {
        let config = StorefrontConfig::for_base_url("http://127.0.0.1:9/api").unwrap();
        let session = SessionStore::restore(MemoryStorage::new());
        let admin = AdminClient::new(ApiClient::new(&config).unwrap(), session.clone());
        (admin, session)
    }

    #[tokio::test]
    async fn test_requires_session() {
        let (admin, _) = client();
        assert!(matches!(admin.users().await, Err(StorefrontError::Auth(Some(_)))));
    }

    #[tokio::test]
    async fn test_requires_admin_role() {
        let (admin, session) = client();
        let user: UserProfile = serde_json::from_str(r#"{"role":"user"}"#).unwrap();
        session.login("tok", user);
        assert!(matches!(
            admin.delete_product(ProductId::new(1)).await,
            Err(StorefrontError::Forbidden(Some(m))) if m == "Admin access required."
        ));
    }
}
