//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are stored in the currency's standard unit (rupees, not paise).
//! The payment gateway bills in the smallest unit, so [`Price::to_minor_units`]
//! converts at the gateway boundary.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A monetary amount with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., rupees, not paise).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: Currency,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Create an INR price.
    #[must_use]
    pub const fn inr(amount: Decimal) -> Self {
        Self::new(amount, Currency::Inr)
    }

    /// Convert to the smallest currency unit (paise for INR, cents for USD).
    ///
    /// Returns `None` if the amount is negative or does not fit in an `i64`
    /// after scaling. Sub-minor fractions are rejected rather than rounded so
    /// a malformed catalog price cannot silently change what the customer is
    /// charged.
    #[must_use]
    pub fn to_minor_units(&self) -> Option<i64> {
        if self.amount.is_sign_negative() {
            return None;
        }
        let scaled = self.amount.checked_mul(Decimal::from(100))?;
        if scaled.fract() != Decimal::ZERO {
            return None;
        }
        scaled.to_i64()
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:.2}", self.currency.code(), self.amount)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Inr,
    Usd,
}

impl Currency {
    /// ISO 4217 alphabetic code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Inr => "INR",
            Self::Usd => "USD",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_to_minor_units_whole_rupees() {
        let price = Price::inr(Decimal::from(499));
        assert_eq!(price.to_minor_units(), Some(49_900));
    }

    #[test]
    fn test_to_minor_units_with_paise() {
        let price = Price::inr(Decimal::new(1999, 2));
        assert_eq!(price.to_minor_units(), Some(1_999));
    }

    #[test]
    fn test_to_minor_units_rejects_sub_paise() {
        let price = Price::inr(Decimal::new(10_005, 3));
        assert_eq!(price.to_minor_units(), None);
    }

    #[test]
    fn test_to_minor_units_rejects_negative() {
        let price = Price::inr(Decimal::from(-5));
        assert_eq!(price.to_minor_units(), None);
    }

    #[test]
    fn test_display() {
        let price = Price::inr(Decimal::new(199, 1));
        assert_eq!(price.to_string(), "INR 19.90");
    }

    #[test]
    fn test_currency_code() {
        assert_eq!(Currency::Inr.code(), "INR");
        assert_eq!(Currency::Usd.code(), "USD");
    }
}
