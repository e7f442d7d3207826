//! Checkout amount type.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CheckoutAmount`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// The input string is empty.
    #[error("amount cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("amount must be a number")]
    NotANumber,
    /// The amount is zero or negative.
    #[error("amount must be greater than zero")]
    NotPositive,
    /// The amount has sub-cent precision.
    #[error("amount can have at most {max} decimal places")]
    TooPrecise {
        /// Maximum allowed decimal places.
        max: u32,
    },
    /// The amount exceeds the accepted maximum.
    #[error("amount must be at most {max}")]
    TooLarge {
        /// Maximum accepted amount.
        max: Decimal,
    },
}

/// An amount the visitor asked to pay.
///
/// ## Constraints
///
/// - Must parse as a plain decimal number (no currency symbols or exponents)
/// - Must be greater than zero
/// - At most two decimal places
/// - At most [`CheckoutAmount::MAX`]
///
/// ## Examples
///
/// ```
/// use elitestore_core::CheckoutAmount;
///
/// assert_eq!(CheckoutAmount::parse("500").unwrap().path_segment(), "500");
/// assert_eq!(CheckoutAmount::parse(" 19.90 ").unwrap().path_segment(), "19.9");
///
/// assert!(CheckoutAmount::parse("").is_err());      // empty
/// assert!(CheckoutAmount::parse("abc").is_err());   // not a number
/// assert!(CheckoutAmount::parse("0").is_err());     // not positive
/// assert!(CheckoutAmount::parse("-5").is_err());    // not positive
/// assert!(CheckoutAmount::parse("1.005").is_err()); // sub-cent
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckoutAmount(Decimal);

impl CheckoutAmount {
    /// Maximum number of decimal places.
    pub const MAX_SCALE: u32 = 2;

    /// Largest amount accepted in a single checkout.
    pub const MAX: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

    /// Parse a `CheckoutAmount` from form input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is empty or only whitespace
    /// - Is not a plain decimal number
    /// - Is zero or negative
    /// - Has more than two decimal places
    /// - Is larger than [`CheckoutAmount::MAX`]
    pub fn parse(s: &str) -> Result<Self, AmountError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AmountError::Empty);
        }

        let value = Decimal::from_str(s).map_err(|_| AmountError::NotANumber)?;

        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive);
        }

        let normalized = value.normalize();
        if normalized.scale() > Self::MAX_SCALE {
            return Err(AmountError::TooPrecise {
                max: Self::MAX_SCALE,
            });
        }

        if normalized > Self::MAX {
            return Err(AmountError::TooLarge { max: Self::MAX });
        }

        Ok(Self(normalized))
    }

    /// Returns the decimal value.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// The amount as embedded in the session-creation URL path.
    ///
    /// Trailing zeros are dropped, so `"19.90"` becomes `"19.9"`.
    #[must_use]
    pub fn path_segment(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for CheckoutAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CheckoutAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_amounts() {
        assert_eq!(CheckoutAmount::parse("500").unwrap().value(), Decimal::new(500, 0));
        assert_eq!(CheckoutAmount::parse("0.01").unwrap().value(), Decimal::new(1, 2));
        assert_eq!(CheckoutAmount::parse("12.50").unwrap().path_segment(), "12.5");
        assert_eq!(CheckoutAmount::parse("1000000").unwrap().path_segment(), "1000000");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(CheckoutAmount::parse(""), Err(AmountError::Empty));
        assert_eq!(CheckoutAmount::parse("   "), Err(AmountError::Empty));
    }

    #[test]
    fn test_parse_not_a_number() {
        assert_eq!(CheckoutAmount::parse("ten"), Err(AmountError::NotANumber));
        assert_eq!(CheckoutAmount::parse("$5"), Err(AmountError::NotANumber));
        assert_eq!(CheckoutAmount::parse("5/1"), Err(AmountError::NotANumber));
    }

    #[test]
    fn test_parse_not_positive() {
        assert_eq!(CheckoutAmount::parse("0"), Err(AmountError::NotPositive));
        assert_eq!(CheckoutAmount::parse("0.00"), Err(AmountError::NotPositive));
        assert_eq!(CheckoutAmount::parse("-20"), Err(AmountError::NotPositive));
    }

    #[test]
    fn test_parse_too_precise() {
        assert_eq!(
            CheckoutAmount::parse("3.141"),
            Err(AmountError::TooPrecise { max: 2 })
        );
        // Trailing zeros do not count as precision
        assert!(CheckoutAmount::parse("3.1400").is_ok());
    }

    #[test]
    fn test_parse_too_large() {
        assert!(matches!(
            CheckoutAmount::parse("1000000.01"),
            Err(AmountError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_path_segment_is_url_safe() {
        let amount = CheckoutAmount::parse("42.5").unwrap();
        assert!(
            amount
                .path_segment()
                .chars()
                .all(|c| c.is_ascii_digit() || c == '.')
        );
    }
}
