//! Product catalog with rating enrichment and filtering.
//!
//! Every load goes back to the backend; nothing is cached. Rating averages
//! are fetched concurrently, one request per product, bounded by the
//! configured concurrency. A product whose rating cannot be fetched simply has
//! no rating.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use styleaura_core::{Money, ProductId};

use crate::api::ApiClient;
use crate::error::Result;
use crate::models::Product;
use crate::task::ScopedTask;

/// Average rating per product. Products without a rating are absent.
pub type Ratings = HashMap<ProductId, f64>;

/// Catalog filters. The default value lets every product through.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    /// Exact brand match; `None` or empty means any brand.
    pub brand: Option<String>,
    /// Inclusive lower price bound.
    pub price_min: Option<Money>,
    /// Inclusive upper price bound.
    pub price_max: Option<Money>,
    /// Minimum average rating; 0 disables the check.
    pub min_rating: f64,
}

impl FilterCriteria {
    fn brand(&self) -> Option<&str> {
        self.brand.as_deref().filter(|b| !b.is_empty())
    }

    const fn has_price_bounds(&self) -> bool {
        self.price_min.is_some() || self.price_max.is_some()
    }

    /// Whether `product` passes every active filter.
    #[must_use]
    pub fn matches(&self, product: &Product, ratings: &Ratings) -> bool {
        if let Some(brand) = self.brand()
            && product.brand.as_deref() != Some(brand)
        {
            return false;
        }

        if self.has_price_bounds() {
            let Some(price) = product.price.amount() else {
                return false;
            };
            if self.price_min.is_some_and(|min| price < min)
                || self.price_max.is_some_and(|max| price > max)
            {
                return false;
            }
        }

        if self.min_rating > 0.0 {
            return ratings
                .get(&product.id)
                .is_some_and(|rating| *rating >= self.min_rating);
        }

        true
    }
}

/// Products passing `criteria`, in catalog order.
#[must_use]
pub fn filter<'a>(
    products: &'a [Product],
    ratings: &Ratings,
    criteria: &FilterCriteria,
) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|product| criteria.matches(product, ratings))
        .collect()
}

/// Distinct non-empty brands in first-seen order.
#[must_use]
pub fn derive_brands(products: &[Product]) -> Vec<String> {
    let mut seen = HashSet::new();
    products
        .iter()
        .filter_map(|product| product.brand.as_deref())
        .filter(|brand| !brand.trim().is_empty())
        .filter(|brand| seen.insert(*brand))
        .map(ToString::to_string)
        .collect()
}

/// How a 0-5 average renders as five stars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StarFill {
    Full,
    Half,
    Empty,
}

/// Star `i` is full when `rating >= i + 1` and half when the rating falls
/// strictly inside it.
#[must_use]
pub fn star_fills(rating: f64) -> [StarFill; 5] {
    let mut stars = [StarFill::Empty; 5];
    for (i, star) in (0_u8..).zip(stars.iter_mut()) {
        let i = f64::from(i);
        if rating >= i + 1.0 {
            *star = StarFill::Full;
        } else if rating > i {
            *star = StarFill::Half;
        }
    }
    stars
}

/// A loaded catalog: products, their ratings and the brand list.
#[derive(Debug, Clone, Default)]
pub struct CatalogView {
    pub products: Vec<Product>,
    pub ratings: Ratings,
    pub brands: Vec<String>,
}

impl CatalogView {
    #[must_use]
    pub fn filtered(&self, criteria: &FilterCriteria) -> Vec<&Product> {
        filter(&self.products, &self.ratings, criteria)
    }

    #[must_use]
    pub fn rating(&self, id: ProductId) -> Option<f64> {
        self.ratings.get(&id).copied()
    }
}

// =============================================================================
// CatalogAggregator
// =============================================================================

/// Loads the catalog and its ratings.
#[derive(Debug, Clone)]
pub struct CatalogAggregator {
    api: ApiClient,
    rating_concurrency: usize,
}

impl CatalogAggregator {
    #[must_use]
    pub fn new(api: ApiClient, rating_concurrency: usize) -> Self {
        Self {
            api,
            rating_concurrency: rating_concurrency.max(1),
        }
    }

    /// Full catalog, or the search results for a non-blank `query`.
    ///
    /// # Errors
    ///
    /// Returns the backend error once retries are exhausted.
    #[instrument(skip(self))]
    pub async fn load_catalog(&self, query: Option<&str>) -> Result<Vec<Product>> {
        match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => self.api.search_products(q).await,
            None => self.api.products().await,
        }
    }

    /// One product by id.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::NotFound` for an unknown id.
    pub async fn load_product(&self, id: ProductId) -> Result<Product> {
        self.api.product(id).await
    }

    /// Average rating of every product, fetched concurrently.
    ///
    /// Failures are logged and leave the product unrated.
    #[instrument(skip_all, fields(products = products.len()))]
    pub async fn fetch_ratings(&self, products: &[Product]) -> Ratings {
        let permits = Arc::new(Semaphore::new(self.rating_concurrency));
        let mut tasks = JoinSet::new();
        let mut seen = HashSet::new();

        for id in products.iter().map(|p| p.id).filter(|id| seen.insert(*id)) {
            let api = self.api.clone();
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return (id, None);
                };
                match api.rating_average(id).await {
                    Ok(rating) => (id, rating),
                    Err(e) => {
                        warn!(product_id = %id, error = %e, "Rating fetch failed");
                        (id, None)
                    }
                }
            });
        }

        let mut ratings = Ratings::with_capacity(seen.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((id, Some(rating))) => {
                    ratings.insert(id, rating);
                }
                Ok((_, None)) => {}
                Err(e) => debug!(error = %e, "Rating task did not complete"),
            }
        }
        ratings
    }

    /// Catalog, ratings and brands in one go.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the product list cannot be loaded.
    /// Rating failures never fail the load.
    pub async fn load(&self, query: Option<&str>) -> Result<CatalogView> {
        let products = self.load_catalog(query).await?;
        let ratings = self.fetch_ratings(&products).await;
        let brands = derive_brands(&products);
        Ok(CatalogView {
            products,
            ratings,
            brands,
        })
    }

    /// [`load`](Self::load) on a task that is cancelled when the handle drops.
    pub fn spawn_load(&self, query: Option<String>) -> ScopedTask<Result<CatalogView>> {
        let this = self.clone();
        ScopedTask::spawn(async move { this.load(query.as_deref()).await })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use styleaura_core::ListedPrice;

    use super::*;

    fn product(id: i64, brand: Option<&str>, price: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: String::new(),
            price: price
                .parse::<Money>()
                .map_or_else(|_| ListedPrice::Unparsable(price.to_string()), ListedPrice::from),
            image_url: None,
            brand: brand.map(ToString::to_string),
            stock_quantity: 1,
            category_id: None,
        }
    }

    fn ids(products: &[&Product]) -> Vec<i64> {
        products.iter().map(|p| p.id.as_i64()).collect()
    }

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn test_empty_criteria_is_identity() {
        let products = vec![
            product(1, Some("X"), "100"),
            product(2, None, "abc"),
            product(3, Some(""), "0"),
        ];
        let filtered = filter(&products, &Ratings::new(), &FilterCriteria::default());
        assert_eq!(ids(&filtered), vec![1, 2, 3]);
    }

    #[test]
    fn test_min_rating_scenario() {
        let products = vec![product(1, Some("X"), "100"), product(2, Some("Y"), "50")];
        let ratings = Ratings::from([(ProductId::new(1), 4.5)]);
        let criteria = FilterCriteria {
            min_rating: 4.0,
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&filter(&products, &ratings, &criteria)), vec![1]);
    }

    #[test]
    fn test_brand_filter() {
        let products = vec![product(1, Some("X"), "100"), product(2, Some("Y"), "50")];
        let mut criteria = FilterCriteria {
            brand: Some("Y".to_string()),
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&filter(&products, &Ratings::new(), &criteria)), vec![2]);

        criteria.brand = Some(String::new());
        assert_eq!(ids(&filter(&products, &Ratings::new(), &criteria)), vec![1, 2]);
    }

    #[test]
    fn test_price_bounds_are_inclusive_and_skip_unparsable() {
        let products = vec![
            product(1, None, "100"),
            product(2, None, "50"),
            product(3, None, "n/a"),
            product(4, None, "10000"),
        ];
        let criteria = FilterCriteria {
            price_min: Some(money("50")),
            price_max: Some(money("100")),
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&filter(&products, &Ratings::new(), &criteria)), vec![1, 2]);

        let criteria = FilterCriteria {
            price_max: Some(money("10000")),
            ..FilterCriteria::default()
        };
        assert_eq!(
            ids(&filter(&products, &Ratings::new(), &criteria)),
            vec![1, 2, 4]
        );
    }

    #[test]
    fn test_derive_brands_first_seen_order() {
        let products = vec![
            product(1, Some("Zara"), "1"),
            product(2, None, "1"),
            product(3, Some("Biba"), "1"),
            product(4, Some("Zara"), "1"),
            product(5, Some(" "), "1"),
        ];
        assert_eq!(derive_brands(&products), vec!["Zara", "Biba"]);
    }

    #[test]
    fn test_star_fills() {
        use StarFill::{Empty, Full, Half};
        assert_eq!(star_fills(4.5), [Full, Full, Full, Full, Half]);
        assert_eq!(star_fills(3.0), [Full, Full, Full, Empty, Empty]);
        assert_eq!(star_fills(0.0), [Empty; 5]);
    }
}
