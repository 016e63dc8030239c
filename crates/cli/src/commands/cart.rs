//! Cart commands.

#![allow(clippy::print_stdout)]

use suturahub_core::ProductId;
use suturahub_storefront::binding::Observable;
use suturahub_storefront::error::AppError;
use suturahub_storefront::models::{AddOutcome, Notice, ProductInput, QuantityChange};
use suturahub_storefront::state::AppState;

use super::money;

/// Print each cart notice as it is raised.
fn echo_notices(state: &AppState) {
    state.cart().subscribe_notices(|notice: &Notice| {
        if notice.text.is_empty() {
            println!("{}", notice.title);
        } else {
            println!("{}: {}", notice.title, notice.text);
        }
    });
}

fn parse_id(raw: &str) -> Result<ProductId, AppError> {
    ProductId::parse(raw)
        .ok_or_else(|| AppError::BadRequest("product id cannot be empty".to_owned()))
}

/// Print the cart contents and totals.
pub fn show(state: &AppState) {
    let cart = state.cart().snapshot();
    if cart.is_empty() {
        println!("Your cart is empty");
        return;
    }

    for line in cart.lines() {
        let price = if line.is_discounted() {
            format!(
                "{} (was {})",
                money(line.unit_price.amount()),
                money(line.original_price.amount())
            )
        } else {
            money(line.unit_price.amount())
        };
        println!(
            "{:<12} {:<32} {:>3} x {:<24} {}",
            line.id.as_str(),
            line.title,
            line.quantity,
            price,
            money(line.line_total())
        );
    }
    println!();
    println!("Items:    {}", cart.item_count());
    if !cart.savings().is_zero() {
        println!("Savings:  {}", money(cart.savings()));
    }
    println!("Total:    {}", money(cart.total()));
}

/// Add a product given on the command line.
pub fn add(state: &AppState, input: ProductInput) -> Result<(), AppError> {
    echo_notices(state);
    let outcome = state.cart().add_item(input)?;
    if let AddOutcome::Incremented { quantity } = outcome {
        println!("Quantity is now {quantity}");
    }
    Ok(())
}

/// Fetch the catalog and add the product with `id`.
pub async fn add_product(state: &AppState, id: &str) -> Result<(), AppError> {
    let id = parse_id(id)?;
    let products = state.api().products().await?;
    let product = products
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| AppError::NotFound(format!("Product {id}")))?;

    add(state, product.to_cart_input(state.api().origin()))
}

/// Remove a line.
pub fn remove(state: &AppState, id: &str) -> Result<(), AppError> {
    echo_notices(state);
    if !state.cart().remove_item(&parse_id(id)?) {
        println!("Product {id} is not in your cart");
    }
    Ok(())
}

/// Set a line's quantity.
pub fn set(state: &AppState, id: &str, quantity: i64) -> Result<(), AppError> {
    echo_notices(state);
    match state.cart().set_quantity(&parse_id(id)?, quantity) {
        QuantityChange::Updated => println!("Quantity set to {quantity}"),
        QuantityChange::Unchanged => println!("Quantity is already {quantity}"),
        QuantityChange::Missing => println!("Product {id} is not in your cart"),
        QuantityChange::OutOfRange => {
            return Err(AppError::BadRequest(format!(
                "Quantity {quantity} is too large for product {id}"
            )));
        }
        QuantityChange::Removed => {}
    }
    Ok(())
}

/// Empty the cart. Requires `--yes`.
pub fn clear(state: &AppState, confirmed: bool) -> Result<(), AppError> {
    if !confirmed {
        return Err(AppError::BadRequest(
            "Clearing removes every item from your cart. Re-run with --yes to confirm.".to_owned(),
        ));
    }
    echo_notices(state);
    state.cart().clear();
    Ok(())
}
