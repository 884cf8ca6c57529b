//! Value objects shared across the storefront domain.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Combination code identifying a SKU, e.g. `"Blue|256GB"`.
///
/// The code is display-only: variant matching runs against the SKU's
/// structured option map, never against this string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkuCode(String);

impl SkuCode {
    pub fn new(value: impl Into<String>) -> Result<Self, SkuCodeError> {
        let value = value.into().trim().to_string();
        if value.is_empty() {
            return Err(SkuCodeError::Empty);
        }
        if value.len() > 64 {
            return Err(SkuCodeError::TooLong);
        }
        Ok(Self(value))
    }

    /// Stand-in code (`"-"`) for SKUs built from no option values.
    pub(crate) fn placeholder() -> Self {
        Self("-".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SkuCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Error)]
pub enum SkuCodeError {
    #[error("SKU code empty")]
    Empty,
    #[error("SKU code too long")]
    TooLong,
}

/// Money value object. Amounts are whole-currency decimals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: String,
}

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self {
        Self { amount, currency: currency.to_string() }
    }

    /// Tanzanian shillings, the storefront's display currency.
    pub fn tzs(amount: i64) -> Self {
        Self::new(Decimal::from(amount), "TZS")
    }

    pub fn zero(currency: &str) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch);
        }
        Ok(Money::new(self.amount + other.amount, &self.currency))
    }

    pub fn multiply(&self, qty: u32) -> Money {
        Money::new(self.amount * Decimal::from(qty), &self.currency)
    }

    /// Back out the pre-discount price from a discounted one:
    /// `price / (1 - percent/100)`. Returns `None` for percentages
    /// outside (0, 100).
    pub fn undiscounted(&self, percent: u8) -> Option<Money> {
        if percent == 0 || percent >= 100 {
            return None;
        }
        let factor = Decimal::ONE - Decimal::from(percent) / Decimal::from(100u8);
        Some(Money::new((self.amount / factor).round_dp(2), &self.currency))
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero("TZS")
    }
}

#[derive(Debug, Clone, Error)]
pub enum MoneyError {
    #[error("currency mismatch")]
    CurrencyMismatch,
}
