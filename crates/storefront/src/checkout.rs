//! Checkout summary for the proceed-to-checkout screen.
//!
//! Payment is out of scope; this only gates entry and computes the totals
//! shown before payment.

#![warn(missing_docs)]

use rust_decimal::Decimal;
use thiserror::Error;

use suturahub_core::{Price, round_money};

use crate::models::cart::{Cart, CartLine};
use crate::models::session::{Session, UserProfile};

/// Flat shipping fee per order, in the store currency.
pub const SHIPPING_FEE: Price = Price::from_minor(1500);

/// VAT rate applied to the subtotal, as a fraction (12.5%).
pub const TAX_RATE: Decimal = Decimal::from_parts(125, 0, 0, false, 3);

/// Reasons checkout cannot start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// Nobody is signed in.
    #[error("Please login to proceed to checkout")]
    NotAuthenticated,
    /// The cart has no lines.
    #[error("Your cart is empty")]
    EmptyCart,
    /// Shipping and tax push the order total past what a `Decimal` can hold.
    #[error("Order total is too large")]
    TotalOutOfRange,
}

/// Totals for a checkout.
///
/// All amounts are in the store currency. `tax` is already rounded to two
/// decimal places, so `total == subtotal + shipping + tax` exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSummary {
    /// The signed-in user placing the order.
    pub customer: UserProfile,
    /// Cart lines in insertion order, as they were when the summary was built.
    pub lines: Vec<CartLine>,
    /// Sum of line totals before shipping and tax.
    pub subtotal: Decimal,
    /// Flat [`SHIPPING_FEE`].
    pub shipping: Decimal,
    /// [`TAX_RATE`] applied to `subtotal`.
    pub tax: Decimal,
    /// Amount due.
    pub total: Decimal,
}

impl CheckoutSummary {
    /// Compute the summary for `cart`, requiring a signed-in user.
    ///
    /// # Errors
    ///
    /// `NotAuthenticated` when nobody is signed in, `EmptyCart` when the cart
    /// has no lines, `TotalOutOfRange` when the amount due overflows.
    pub fn prepare(session: &Session, cart: &Cart) -> Result<Self, CheckoutError> {
        let customer = session
            .user()
            .filter(|_| session.is_authenticated())
            .ok_or(CheckoutError::NotAuthenticated)?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let subtotal = cart.checked_total().ok_or(CheckoutError::TotalOutOfRange)?;
        let shipping = SHIPPING_FEE.amount();
        let tax = subtotal
            .checked_mul(TAX_RATE)
            .map(round_money)
            .ok_or(CheckoutError::TotalOutOfRange)?;
        let total = subtotal
            .checked_add(shipping)
            .and_then(|sum| sum.checked_add(tax))
            .ok_or(CheckoutError::TotalOutOfRange)?;

        Ok(Self {
            customer: customer.clone(),
            lines: cart.lines().cloned().collect(),
            subtotal,
            shipping,
            tax,
            total,
        })
    }
}
