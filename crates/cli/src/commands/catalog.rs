//! Catalog browsing.

#![allow(clippy::print_stdout)]

use suturahub_storefront::catalog::{PRODUCTS_PER_PAGE, Page, search};
use suturahub_storefront::error::AppError;
use suturahub_storefront::state::AppState;

use super::money;

/// Print one page of the (optionally filtered) catalog.
pub async fn list(state: &AppState, query: &str, page: usize) -> Result<(), AppError> {
    let products = state.api().products().await?;
    let matches = search(&products, query);

    if matches.is_empty() {
        if query.trim().is_empty() {
            println!("No products available");
        } else {
            println!("No products match '{query}'");
        }
        return Ok(());
    }

    let page = Page::of(&matches, page, PRODUCTS_PER_PAGE);
    for product in page.items {
        let price = if product.has_valid_discount() {
            format!(
                "{} (was {}, -{}%)",
                money(product.effective_price().amount()),
                money(product.price.amount()),
                product.discount_percent.unwrap_or_default().normalize()
            )
        } else {
            money(product.price.amount())
        };
        println!(
            "{:<12} {:<36} {:<16} {}",
            product.id.as_str(),
            product.display_title(),
            product.category,
            price
        );
    }

    println!();
    println!(
        "Page {} of {} ({} products){}{}",
        page.number,
        page.total_pages,
        matches.len(),
        if page.has_previous() { "  --page N-1 for previous" } else { "" },
        if page.has_next() { "  --page N+1 for next" } else { "" },
    );
    Ok(())
}
