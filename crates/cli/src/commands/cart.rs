//! Cart commands.

#![allow(clippy::print_stdout)]

use styleaura_core::ProductId;
use styleaura_storefront::AppState;
use styleaura_storefront::models::Cart;

use super::CliError;

fn require_session(state: &AppState) -> Result<(), CliError> {
    if state.session().is_authenticated() {
        Ok(())
    } else {
        Err(CliError::NotSignedIn)
    }
}

fn print_cart(cart: &Cart) {
    if cart.is_empty() {
        println!("Your cart is empty.");
        return;
    }
    for item in cart.items() {
        println!(
            "{:>5}  {:<40} {:>3} × ₹{:>10} = ₹{:>10}",
            item.product_id,
            item.name,
            item.quantity,
            item.price,
            item.subtotal()
        );
    }
    println!("{} item(s), total ₹{}", cart.item_count(), cart.total());
}

/// Show the cart.
///
/// # Errors
///
/// Returns an error without a session or if the cart cannot be fetched.
pub async fn list(state: &AppState) -> Result<(), CliError> {
    require_session(state)?;
    let cart = state.cart().list().await?;
    print_cart(&cart);
    Ok(())
}

/// Add a product.
///
/// # Errors
///
/// Returns an error without a session or if the backend rejects the change.
pub async fn add(state: &AppState, id: ProductId, quantity: u32) -> Result<(), CliError> {
    require_session(state)?;
    let cart = state.cart().add(id, quantity).await?;
    print_cart(&cart);
    Ok(())
}

/// Remove a product.
///
/// # Errors
///
/// Returns an error without a session or if the backend rejects the change.
pub async fn remove(state: &AppState, id: ProductId) -> Result<(), CliError> {
    require_session(state)?;
    let cart = state.cart().remove(id).await?;
    print_cart(&cart);
    Ok(())
}

/// Change a line's quantity by `delta`.
///
/// # Errors
///
/// Returns an error without a session, if the product is not in the cart, or
/// if the backend rejects the change.
pub async fn adjust(state: &AppState, id: ProductId, delta: i64) -> Result<(), CliError> {
    require_session(state)?;
    // The new quantity is computed from the mirror, so load it first
    let current = state.cart().list().await?;
    if !current.contains(id) {
        return Err(CliError::Rejected(format!("Product {id} is not in your cart.")));
    }
    let cart = state.cart().set_quantity(id, delta).await?;
    print_cart(&cart);
    Ok(())
}
