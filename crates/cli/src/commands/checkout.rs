//! Checkout summary.

#![allow(clippy::print_stdout)]

use suturahub_storefront::binding::Observable;
use suturahub_storefront::checkout::CheckoutSummary;
use suturahub_storefront::error::AppError;
use suturahub_storefront::state::AppState;

use super::money;

/// Print the order summary shown before payment.
pub fn summary(state: &AppState) -> Result<(), AppError> {
    let session = state.session().snapshot();
    let cart = state.cart().snapshot();
    let summary = CheckoutSummary::prepare(&session, &cart)?;

    println!("Order for {} <{}>", summary.customer.name, summary.customer.email);
    println!();
    for line in &summary.lines {
        println!(
            "{:<36} {:>3} x {:>10}  {:>10}",
            line.title,
            line.quantity,
            money(line.unit_price.amount()),
            money(line.line_total())
        );
    }
    println!();
    println!("Subtotal:   {:>10}", money(summary.subtotal));
    println!("Shipping:   {:>10}", money(summary.shipping));
    println!("VAT 12.5%:  {:>10}", money(summary.tax));
    println!("Total:      {:>10}", money(summary.total));
    Ok(())
}
