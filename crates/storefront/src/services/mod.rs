//! Storefront services.
//!
//! # Services
//!
//! - `auth` - Login, registration and Google sign-in
//! - `cart` - Cart mirror kept in step with the backend
//! - `catalog` - Product catalog, rating fan-out and filtering
//! - `reviews` - Review list and average rating
//! - `detail` - Product detail pipeline
//! - `admin` - Role-gated admin endpoints

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod detail;
pub mod reviews;

pub use admin::AdminClient;
pub use auth::{AuthFlow, AuthService, Registration};
pub use cart::{CartSnapshot, CartSynchronizer, SyncStatus};
pub use catalog::{CatalogAggregator, CatalogView, FilterCriteria, Ratings};
pub use detail::{CartAction, ProductDetail};
pub use reviews::{ReviewAggregator, ReviewList};
