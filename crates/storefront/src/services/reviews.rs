//! Product reviews and their aggregate rating.

use tracing::{instrument, warn};

use styleaura_core::ProductId;

use crate::api::ApiClient;
use crate::models::Review;

/// Number of reviews shown before "show all".
pub const PREVIEW_LEN: usize = 3;

/// Mean `rating_value`, or `None` when there are no reviews.
#[must_use]
pub fn compute_average(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let sum: u32 = reviews
        .iter()
        .map(|review| u32::from(u8::from(review.rating_value)))
        .sum();
    let count = u32::try_from(reviews.len()).ok()?;
    Some(f64::from(sum) / f64::from(count))
}

/// Loads the reviews of one product.
#[derive(Debug, Clone)]
pub struct ReviewAggregator {
    api: ApiClient,
}

impl ReviewAggregator {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Reviews in server order. A failed fetch yields no reviews.
    #[instrument(skip(self))]
    pub async fn load_reviews(&self, product_id: ProductId) -> Vec<Review> {
        match self.api.reviews(product_id).await {
            Ok(reviews) => reviews,
            Err(e) => {
                warn!(%product_id, error = %e, "Review fetch failed, showing none");
                Vec::new()
            }
        }
    }
}

/// Reviews with a preview/full toggle.
///
/// Toggling only changes which slice is visible; the list is never refetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewList {
    reviews: Vec<Review>,
    show_all: bool,
}

impl ReviewList {
    #[must_use]
    pub const fn new(reviews: Vec<Review>) -> Self {
        Self {
            reviews,
            show_all: false,
        }
    }

    /// The first [`PREVIEW_LEN`] reviews, or all of them.
    #[must_use]
    pub fn visible(&self) -> &[Review] {
        if self.show_all {
            &self.reviews
        } else {
            self.reviews
                .get(..PREVIEW_LEN)
                .unwrap_or(&self.reviews)
        }
    }

    #[must_use]
    pub fn all(&self) -> &[Review] {
        &self.reviews
    }

    pub const fn toggle(&mut self) {
        self.show_all = !self.show_all;
    }

    pub const fn set_show_all(&mut self, show_all: bool) {
        self.show_all = show_all;
    }

    #[must_use]
    pub const fn is_showing_all(&self) -> bool {
        self.show_all
    }

    /// Whether a "show all" control is worth offering.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.reviews.len() > PREVIEW_LEN
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    #[must_use]
    pub fn average(&self) -> Option<f64> {
        compute_average(&self.reviews)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use styleaura_core::{RatingValue, ReviewId};

    use super::*;

    fn review(id: i64, stars: i64) -> Review {
        Review {
            id: ReviewId::new(id),
            product_id: Some(ProductId::new(1)),
            user_id: None,
            user_name: None,
            rating_value: RatingValue::new(stars).unwrap(),
            text: String::new(),
        }
    }

    #[test]
    fn test_average() {
        assert_eq!(compute_average(&[]), None);
        assert_eq!(compute_average(&[review(1, 4), review(2, 5)]), Some(4.5));
        assert_eq!(compute_average(&[review(1, 1)]), Some(1.0));
    }

    #[test]
    fn test_preview_toggle() {
        let mut list = ReviewList::new((1..=5).map(|i| review(i, 3)).collect());
        assert_eq!(list.visible().len(), PREVIEW_LEN);
        assert!(list.is_truncated());

        list.toggle();
        assert_eq!(list.visible().len(), 5);
        list.toggle();
        assert_eq!(list.visible().len(), PREVIEW_LEN);
    }

    #[test]
    fn test_short_list_shows_everything() {
        let list = ReviewList::new(vec![review(1, 5)]);
        assert_eq!(list.visible().len(), 1);
        assert!(!list.is_truncated());
        assert!(ReviewList::default().visible().is_empty());
    }
}
