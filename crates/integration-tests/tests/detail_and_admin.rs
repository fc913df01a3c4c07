//! Product detail pipeline and the admin endpoints.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use rust_decimal::Decimal;
use serde_json::json;

use styleaura_core::{CategoryId, ProductId};
use styleaura_integration_tests::{MockBackend, review};
use styleaura_storefront::StorefrontError;
use styleaura_storefront::models::NewProduct;
use styleaura_storefront::navigation::Route;
use styleaura_storefront::services::{CartAction, ProductDetail};

#[tokio::test]
async fn test_detail_loads_reviews_and_average() {
    let backend = MockBackend::seeded().await;
    let app = backend.app();

    let detail = ProductDetail::load(app.catalog(), app.reviews(), ProductId::new(1))
        .await
        .unwrap();
    assert_eq!(detail.product.name, "Linen Kurta");
    assert_eq!(detail.reviews.len(), 2);
    assert_eq!(detail.average, Some(4.5));
    assert_eq!(detail.reviews.visible()[0].author_label(), "Asha");
}

#[tokio::test]
async fn test_long_review_list_is_previewed() {
    let backend = MockBackend::seeded().await;
    backend.state().reviews.insert(
        3,
        (1..=5)
            .map(|i| review(100 + i, 3, "Guest", 4, "Nice"))
            .chain(std::iter::once(json!({ "ratingId": 200, "ratingValue": 9 })))
            .collect(),
    );
    let app = backend.app();

    let mut detail = ProductDetail::load(app.catalog(), app.reviews(), ProductId::new(3))
        .await
        .unwrap();
    // The out-of-range entry is skipped
    assert_eq!(detail.reviews.len(), 5);
    assert!(detail.reviews.is_truncated());
    assert_eq!(detail.reviews.visible().len(), 3);

    let requests = backend.total_requests();
    detail.reviews.toggle();
    assert_eq!(detail.reviews.visible().len(), 5);
    assert_eq!(backend.total_requests(), requests);
}

#[tokio::test]
async fn test_review_failure_shows_no_reviews() {
    let backend = MockBackend::seeded().await;
    backend.state().failing_reviews = true;
    let app = backend.app();

    let detail = ProductDetail::load(app.catalog(), app.reviews(), ProductId::new(1))
        .await
        .unwrap();
    assert!(detail.reviews.is_empty());
    assert_eq!(detail.average, None);
}

#[tokio::test]
async fn test_missing_product_fails_the_detail() {
    let backend = MockBackend::seeded().await;
    let app = backend.app();

    let err = ProductDetail::load(app.catalog(), app.reviews(), ProductId::new(42))
        .await
        .unwrap_err();
    assert!(matches!(err, StorefrontError::NotFound(_)));
    assert_eq!(backend.request_count("GET /ProductRatings"), 0);
}

#[tokio::test]
async fn test_cart_action_follows_session_and_cart() {
    let backend = MockBackend::seeded().await;
    let app = backend.app();
    let detail = ProductDetail::load(app.catalog(), app.reviews(), ProductId::new(3))
        .await
        .unwrap();

    assert_eq!(
        detail.cart_action(&app.session().snapshot(), &app.cart().cart()),
        CartAction::SignInRequired {
            from: Route::Product(ProductId::new(3))
        }
    );

    app.auth()
        .login("asha@styleaura.in", "secret", None)
        .await
        .unwrap();
    assert_eq!(
        detail.cart_action(&app.session().snapshot(), &app.cart().cart()),
        CartAction::AddToCart
    );

    app.cart().add(ProductId::new(3), 1).await.unwrap();
    assert_eq!(
        detail.cart_action(&app.session().snapshot(), &app.cart().cart()),
        CartAction::ViewCart
    );
}

#[tokio::test]
async fn test_admin_listings() {
    let backend = MockBackend::seeded().await;
    let app = backend.app();
    app.auth()
        .login("admin@styleaura.in", "admin123", None)
        .await
        .unwrap();

    let users = app.admin().users().await.unwrap();
    assert_eq!(users.len(), 3);
    assert_eq!(users[1].first_name, "Asha");

    let products = app.admin().products().await.unwrap();
    assert_eq!(products.len(), 5);
}

#[tokio::test]
async fn test_admin_product_management() {
    let backend = MockBackend::seeded().await;
    let app = backend.app();
    app.auth()
        .login("admin@styleaura.in", "admin123", None)
        .await
        .unwrap();

    let product = NewProduct {
        name: "Chikankari Kurti".to_string(),
        description: "Hand embroidered".to_string(),
        price: Decimal::new(189_900, 2),
        image_url: String::new(),
        stock_quantity: 4,
        category_id: CategoryId::new(2),
    };
    app.admin().add_product(&product).await.unwrap();

    let products = app.catalog().load_catalog(Some("chikankari")).await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].price.amount().unwrap().to_string(), "1899.00");

    app.admin().delete_product(products[0].id).await.unwrap();
    let err = app.catalog().load_product(products[0].id).await.unwrap_err();
    assert!(matches!(err, StorefrontError::NotFound(_)));
}

#[tokio::test]
async fn test_non_admin_is_refused_locally() {
    let backend = MockBackend::seeded().await;
    let app = backend.app();

    assert!(matches!(
        app.admin().users().await,
        Err(StorefrontError::Auth(Some(_)))
    ));

    app.auth()
        .login("ravi@styleaura.in", "secret", None)
        .await
        .unwrap();
    let before = backend.total_requests();
    let err = app.admin().products().await.unwrap_err();
    assert_eq!(
        err.user_message("Admin request failed"),
        "Admin access required."
    );
    assert_eq!(backend.total_requests(), before);
}

#[tokio::test]
async fn test_non_array_admin_body_is_empty() {
    let backend = MockBackend::seeded().await;
    let token = backend.token_of("admin@styleaura.in");
    let app = backend.app();

    // Reaches the endpoint directly; the service only knows users and products
    let rows: Vec<serde_json::Value> = app
        .api()
        .admin_list(&secrecy::SecretString::from(token), "orders")
        .await
        .unwrap();
    assert!(rows.is_empty());
}
