//! Catalog and product detail commands.

#![allow(clippy::print_stdout)]

use rust_decimal::Decimal;

use styleaura_core::{Money, ProductId};
use styleaura_storefront::AppState;
use styleaura_storefront::services::catalog::{StarFill, star_fills};
use styleaura_storefront::services::{CartAction, FilterCriteria, ProductDetail};

use super::CliError;

/// Flags of the `products` command.
#[derive(Debug, Default)]
pub struct ProductFilters {
    pub search: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_rating: f64,
}

impl ProductFilters {
    fn criteria(&self) -> Result<FilterCriteria, CliError> {
        let bound = |value: Option<Decimal>| {
            value
                .map(Money::new)
                .transpose()
                .map_err(|e| CliError::Rejected(e.to_string()))
        };
        if !(0.0..=5.0).contains(&self.min_rating) {
            return Err(CliError::Rejected(
                "Minimum rating must be between 0 and 5.".to_string(),
            ));
        }
        Ok(FilterCriteria {
            brand: self.brand.clone(),
            price_min: bound(self.min_price)?,
            price_max: bound(self.max_price)?,
            min_rating: self.min_rating,
        })
    }
}

fn stars(rating: f64) -> String {
    star_fills(rating)
        .iter()
        .map(|fill| match fill {
            StarFill::Full => '★',
            StarFill::Half => '⯪',
            StarFill::Empty => '☆',
        })
        .collect()
}

/// List the catalog with its filters applied.
///
/// # Errors
///
/// Returns an error if the product list cannot be loaded.
pub async fn products(state: &AppState, filters: ProductFilters) -> Result<(), CliError> {
    let criteria = filters.criteria()?;
    let catalog = state.catalog().load(filters.search.as_deref()).await?;

    if !catalog.brands.is_empty() {
        println!("Brands: {}", catalog.brands.join(", "));
    }

    let visible = catalog.filtered(&criteria);
    if visible.is_empty() {
        println!("No products found.");
        return Ok(());
    }

    for product in visible {
        let rating = catalog
            .rating(product.id)
            .map(|r| format!("  {} ({r:.1})", stars(r)))
            .unwrap_or_default();
        println!(
            "{:>5}  {:<40} ₹{:>10}{rating}",
            product.id, product.name, product.price
        );
    }
    Ok(())
}

/// Show one product with its reviews.
///
/// # Errors
///
/// Returns an error if the product cannot be loaded.
pub async fn product(state: &AppState, id: ProductId, all_reviews: bool) -> Result<(), CliError> {
    let mut detail = ProductDetail::load(state.catalog(), state.reviews(), id).await?;
    detail.reviews.set_show_all(all_reviews);

    let product = &detail.product;
    println!("{}", product.name);
    if let Some(brand) = &product.brand {
        println!("Brand: {brand}");
    }
    println!("Price: ₹{}", product.price);
    println!("In stock: {}", product.stock_quantity);
    if !product.description.is_empty() {
        println!("\n{}", product.description);
    }

    match detail.average {
        Some(avg) => println!(
            "\n{} {avg:.1} from {} review(s)",
            stars(avg),
            detail.reviews.len()
        ),
        None => println!("\nNo reviews yet."),
    }
    for review in detail.reviews.visible() {
        println!(
            "- {} ({}/5): {}",
            review.author_label(),
            review.rating_value.stars(),
            review.text
        );
    }
    if detail.reviews.is_truncated() && !detail.reviews.is_showing_all() {
        let hidden = detail.reviews.len() - detail.reviews.visible().len();
        println!("  ... {hidden} more (use --all-reviews)");
    }

    let cart = if state.session().is_authenticated() {
        state.cart().list().await.unwrap_or_default()
    } else {
        state.cart().cart()
    };
    match detail.cart_action(&state.session().snapshot(), &cart) {
        CartAction::SignInRequired { from } => {
            println!("\nSign in to add this to your cart: sa-cli login --redirect {from}");
        }
        CartAction::AddToCart => println!("\nAdd to cart: sa-cli cart add {id}"),
        CartAction::ViewCart => println!("\nAlready in your cart: sa-cli cart list"),
    }
    Ok(())
}
