//! Admin commands.

#![allow(clippy::print_stdout)]

use styleaura_core::ProductId;
use styleaura_storefront::AppState;
use styleaura_storefront::models::NewProduct;

use super::CliError;

/// List users.
///
/// # Errors
///
/// Returns an error for non-admin sessions or backend failures.
pub async fn users(state: &AppState) -> Result<(), CliError> {
    let users = state.admin().users().await?;
    println!("{:>5}  {:<15} {:<15} {:<35} Role", "ID", "First", "Last", "Email");
    for user in users {
        println!(
            "{:>5}  {:<15} {:<15} {:<35} {}",
            user.id,
            user.first_name,
            user.last_name,
            user.email,
            user.role.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

/// List products.
///
/// # Errors
///
/// Returns an error for non-admin sessions or backend failures.
pub async fn products(state: &AppState) -> Result<(), CliError> {
    let products = state.admin().products().await?;
    println!("{:>5}  {:<40} {:>10} {:>8} Stock", "ID", "Name", "Price", "Category");
    for product in products {
        let category = product
            .category_id
            .map_or_else(|| "-".to_string(), |c| c.to_string());
        println!(
            "{:>5}  {:<40} {:>10} {:>8} {}",
            product.id, product.name, product.price, category, product.stock_quantity
        );
    }
    Ok(())
}

/// Create a product.
///
/// # Errors
///
/// Returns an error for invalid input, non-admin sessions or backend failures.
pub async fn add_product(state: &AppState, product: &NewProduct) -> Result<(), CliError> {
    state.admin().add_product(product).await?;
    println!("Product \"{}\" added.", product.name);
    Ok(())
}

/// Delete a product.
///
/// # Errors
///
/// Returns an error for non-admin sessions or backend failures.
pub async fn delete_product(state: &AppState, id: ProductId) -> Result<(), CliError> {
    state.admin().delete_product(id).await?;
    println!("Product {id} deleted.");
    Ok(())
}
