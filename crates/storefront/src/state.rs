//! Application state owning every storefront service.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::config::StorefrontConfig;
use crate::error::Result;
use crate::services::{
    AdminClient, AuthService, CartSynchronizer, CatalogAggregator, ReviewAggregator,
};
use crate::session::{FileStorage, SessionStorage, SessionStore};
use crate::task::ScopedTask;

/// Application state shared by every consumer.
///
/// This struct is cheaply cloneable via `Arc`. Build one per application and
/// pass it by reference; all services share one HTTP client and one session.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: ApiClient,
    session: SessionStore,
    cart: CartSynchronizer,
    catalog: CatalogAggregator,
    reviews: ReviewAggregator,
    auth: AuthService,
    admin: AdminClient,
}

impl AppState {
    /// Create state with the session persisted under `config.session_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self> {
        let storage = FileStorage::new(&config.session_dir);
        Self::with_storage(config, storage)
    }

    /// Create state with a caller-supplied session storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_storage(config: StorefrontConfig, storage: impl SessionStorage) -> Result<Self> {
        let api = ApiClient::new(&config)?;
        let session = SessionStore::restore(storage);
        let cart = CartSynchronizer::new(api.clone(), session.clone(), config.on_unauthorized);
        let catalog = CatalogAggregator::new(api.clone(), config.rating_concurrency);
        let reviews = ReviewAggregator::new(api.clone());
        let auth = AuthService::new(api.clone(), session.clone());
        let admin = AdminClient::new(api.clone(), session.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                session,
                cart,
                catalog,
                reviews,
                auth,
                admin,
            }),
        })
    }

    /// Keep the cart in step with the session until the handle is dropped.
    pub fn start(&self) -> ScopedTask<()> {
        self.inner.cart.spawn_session_listener()
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    #[must_use]
    pub fn cart(&self) -> &CartSynchronizer {
        &self.inner.cart
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogAggregator {
        &self.inner.catalog
    }

    #[must_use]
    pub fn reviews(&self) -> &ReviewAggregator {
        &self.inner.reviews
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    #[must_use]
    pub fn admin(&self) -> &AdminClient {
        &self.inner.admin
    }
}
