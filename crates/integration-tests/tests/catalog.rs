//! Catalog loading, rating enrichment and filtering against the mock backend.

#![allow(clippy::unwrap_used)]

use serde_json::json;

use styleaura_core::{Money, ProductId};
use styleaura_integration_tests::{BackendState, MockBackend, product};
use styleaura_storefront::StorefrontError;
use styleaura_storefront::models::Product;
use styleaura_storefront::services::FilterCriteria;

fn ids<'a>(products: impl IntoIterator<Item = &'a Product>) -> Vec<i64> {
    products.into_iter().map(|p| p.id.as_i64()).collect()
}

#[tokio::test]
async fn test_load_enriches_with_ratings_and_brands() {
    let backend = MockBackend::seeded().await;
    let app = backend.app();

    let view = app.catalog().load(None).await.unwrap();
    assert_eq!(ids(&view.products), vec![1, 2, 3, 4, 5]);
    assert_eq!(view.rating(ProductId::new(1)), Some(4.5));
    assert_eq!(view.rating(ProductId::new(4)), None);
    assert_eq!(view.ratings.len(), 3);
    assert_eq!(view.brands, vec!["Fabindia", "Biba"]);

    // One rating request per product
    assert_eq!(backend.request_count("GET /ProductRatings/product/"), 5);
}

#[tokio::test]
async fn test_unrated_products_fail_a_rating_filter() {
    let state = BackendState {
        products: vec![
            product(1, "Block Print Top", Some("X"), json!(100)),
            product(2, "Plain Tee", Some("Y"), json!(50)),
        ],
        ..BackendState::default()
    };
    let backend = MockBackend::start(state).await;
    backend.state().ratings.insert(1, json!(4.5));
    let app = backend.app();

    let view = app.catalog().load(None).await.unwrap();
    let criteria = FilterCriteria {
        min_rating: 4.0,
        ..FilterCriteria::default()
    };
    assert_eq!(ids(view.filtered(&criteria)), vec![1]);
    assert_eq!(ids(view.filtered(&FilterCriteria::default())), vec![1, 2]);
}

#[tokio::test]
async fn test_combined_filters() {
    let backend = MockBackend::seeded().await;
    let view = backend.app().catalog().load(None).await.unwrap();

    let cheap = FilterCriteria {
        price_max: Some("1500".parse::<Money>().unwrap()),
        ..FilterCriteria::default()
    };
    // The unparsable price never passes a price bound
    assert_eq!(ids(view.filtered(&cheap)), vec![1, 3]);

    let fabindia_rated = FilterCriteria {
        brand: Some("Fabindia".to_string()),
        min_rating: 4.5,
        ..FilterCriteria::default()
    };
    assert_eq!(ids(view.filtered(&fabindia_rated)), vec![1]);

    let biba = FilterCriteria {
        brand: Some("Biba".to_string()),
        ..FilterCriteria::default()
    };
    assert_eq!(ids(view.filtered(&biba)), vec![2, 5]);
}

#[tokio::test]
async fn test_search_query_is_encoded() {
    let backend = MockBackend::seeded().await;
    let app = backend.app();

    let view = app.catalog().load(Some("silk saree")).await.unwrap();
    assert_eq!(ids(&view.products), vec![2]);
    assert_eq!(view.brands, vec!["Biba"]);
    assert_eq!(backend.request_count("GET /Products/search"), 1);
}

#[tokio::test]
async fn test_blank_search_loads_full_catalog() {
    let backend = MockBackend::seeded().await;
    let products = backend
        .app()
        .catalog()
        .load_catalog(Some("   "))
        .await
        .unwrap();
    assert_eq!(products.len(), 5);
    assert_eq!(backend.request_count("GET /Products/search"), 0);
}

#[tokio::test]
async fn test_rating_failures_leave_products_unrated() {
    let backend = MockBackend::seeded().await;
    {
        let mut state = backend.state();
        state.failing_ratings.insert(1);
        // Out of range
        state.ratings.insert(4, json!(7.5));
    }

    let view = backend.app().catalog().load(None).await.unwrap();
    assert_eq!(view.products.len(), 5);
    assert_eq!(view.rating(ProductId::new(1)), None);
    assert_eq!(view.rating(ProductId::new(4)), None);
    assert_eq!(view.rating(ProductId::new(3)), Some(4.0));
}

#[tokio::test]
async fn test_background_load_can_be_joined() {
    let backend = MockBackend::seeded().await;
    let app = backend.app();

    let task = app.catalog().spawn_load(Some("kurta".to_string()));
    let view = task.join().await.unwrap().unwrap();
    assert_eq!(ids(&view.products), vec![1]);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let backend = MockBackend::seeded().await;
    let err = backend
        .app()
        .catalog()
        .load_product(ProductId::new(99))
        .await
        .unwrap_err();
    assert!(matches!(err, StorefrontError::NotFound(_)));
}
