//! Product detail view: product, reviews and the cart action.

use tracing::instrument;

use styleaura_core::ProductId;

use crate::error::Result;
use crate::models::{Cart, Product};
use crate::navigation::Route;
use crate::services::catalog::CatalogAggregator;
use crate::services::reviews::{ReviewAggregator, ReviewList};
use crate::session::Session;

/// What the "add to cart" control does on the detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// No session: sign in first, then come back to `from`.
    SignInRequired { from: Route },
    AddToCart,
    /// The product is already in the cart.
    ViewCart,
}

/// Everything the detail view shows.
#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub product: Product,
    pub reviews: ReviewList,
    /// Mean of the loaded reviews.
    pub average: Option<f64>,
}

impl ProductDetail {
    /// Load the product, then its reviews, then compute the average.
    ///
    /// # Errors
    ///
    /// Fails only if the product cannot be loaded; review failures yield an
    /// empty list.
    #[instrument(skip(catalog, reviews))]
    pub async fn load(
        catalog: &CatalogAggregator,
        reviews: &ReviewAggregator,
        id: ProductId,
    ) -> Result<Self> {
        let product = catalog.load_product(id).await?;
        Ok(Self::with_product(product, reviews).await)
    }

    /// Build the view for a product the caller already holds (e.g. from the
    /// catalog list), skipping the product fetch.
    pub async fn with_product(product: Product, reviews: &ReviewAggregator) -> Self {
        let reviews = ReviewList::new(reviews.load_reviews(product.id).await);
        let average = reviews.average();
        Self {
            product,
            reviews,
            average,
        }
    }

    #[must_use]
    pub fn route(&self) -> Route {
        Route::Product(self.product.id)
    }

    #[must_use]
    pub fn cart_action(&self, session: &Session, cart: &Cart) -> CartAction {
        if !session.is_authenticated() {
            CartAction::SignInRequired { from: self.route() }
        } else if cart.contains(self.product.id) {
            CartAction::ViewCart
        } else {
            CartAction::AddToCart
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use styleaura_core::ListedPrice;

    use super::*;
    use crate::models::{CartItem, UserProfile};
    use crate::session::{MemoryStorage, SessionStore};

    fn detail() -> ProductDetail {
        ProductDetail {
            product: Product {
                id: ProductId::new(7),
                name: "Saree".to_string(),
                description: String::new(),
                price: ListedPrice::from("2500".parse::<styleaura_core::Money>().unwrap()),
                image_url: None,
                brand: None,
                stock_quantity: 2,
                category_id: None,
            },
            reviews: ReviewList::default(),
            average: None,
        }
    }

    #[test]
    fn test_cart_action() {
        let detail = detail();
        let store = SessionStore::restore(MemoryStorage::new());

        assert_eq!(
            detail.cart_action(&store.snapshot(), &Cart::empty()),
            CartAction::SignInRequired {
                from: Route::Product(ProductId::new(7))
            }
        );

        store.login("tok", UserProfile::default());
        assert_eq!(
            detail.cart_action(&store.snapshot(), &Cart::empty()),
            CartAction::AddToCart
        );

        let cart = Cart::from_server(vec![CartItem {
            product_id: ProductId::new(7),
            name: "Saree".to_string(),
            price: "2500".parse().unwrap(),
            quantity: 1,
            image_url: None,
        }])
        .unwrap();
        assert_eq!(
            detail.cart_action(&store.snapshot(), &cart),
            CartAction::ViewCart
        );
    }
}
