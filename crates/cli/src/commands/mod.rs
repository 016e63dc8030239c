//! Command implementations.
//!
//! Each command works through the shared `AppState`; nothing here touches
//! storage directly.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod sell;

use rust_decimal::Decimal;
use suturahub_core::CurrencyCode;

/// Format an amount for display, e.g. `₵65.47`.
pub fn money(amount: Decimal) -> String {
    format!("{}{:.2}", CurrencyCode::default().symbol(), amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money() {
        assert_eq!(money(Decimal::new(6547, 2)), "₵65.47");
        assert_eq!(money(Decimal::from(15)), "₵15.00");
    }
}
