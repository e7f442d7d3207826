//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Markup applied to derive the "list" price shown next to the selling price.
const LIST_PRICE_MARKUP: Decimal = Decimal::from_parts(13, 0, 0, false, 1);

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Prices cannot be negative.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
}

/// A non-negative price in the store currency.
///
/// The catalog reports prices as plain JSON numbers; they are parsed into a
/// `Decimal` so that comparisons and totals are exact.
///
/// ```
/// use elitestore_core::Price;
/// use rust_decimal::Decimal;
///
/// let price = Price::new(Decimal::new(10995, 2)).unwrap();
/// assert_eq!(price.to_string(), "$109.95");
/// assert!(Price::new(Decimal::NEGATIVE_ONE).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Returns the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price multiplied by a quantity.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Decimal {
        self.0 * Decimal::from(quantity)
    }

    /// The list price displayed struck through next to the selling price.
    #[must_use]
    pub fn list_price(&self) -> Self {
        Self((self.0 * LIST_PRICE_MARKUP).round_dp(2))
    }

    /// Whole-number discount of the selling price against the list price.
    #[must_use]
    pub fn discount_percent(&self) -> u32 {
        let list = self.list_price().0;
        if list.is_zero() {
            return 0;
        }
        let percent = ((list - self.0) / list * Decimal::ONE_HUNDRED).round();
        percent.to_u32().unwrap_or(0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}
