//! Monetary amounts using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`CurrencyCode`] or combining [`Money`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The code is not three ASCII letters.
    #[error("invalid currency code: {0:?}")]
    InvalidCurrency(String),
    /// Two amounts in different currencies were combined.
    #[error("currency mismatch: {0} vs {1}")]
    CurrencyMismatch(CurrencyCode, CurrencyCode),
    /// The result does not fit in a decimal.
    #[error("amount overflow")]
    Overflow,
}

/// ISO 4217 currency code, stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parse a three-letter code, normalizing to uppercase.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::InvalidCurrency` if the input is not three ASCII letters.
    pub fn parse(code: &str) -> Result<Self, MoneyError> {
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code.to_ascii_uppercase()))
        } else {
            Err(MoneyError::InvalidCurrency(code.to_owned()))
        }
    }

    /// The uppercase code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display symbol for the handful of currencies the shop sells in.
    #[must_use]
    pub fn symbol(&self) -> Option<&'static str> {
        match self.0.as_str() {
            "USD" | "CAD" | "AUD" | "NZD" => Some("$"),
            "EUR" => Some("€"),
            "GBP" => Some("£"),
            "JPY" => Some("¥"),
            _ => None,
        }
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self("USD".to_owned())
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

/// An amount of money in a single currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Add two amounts of the same currency.
    ///
    /// # Errors
    ///
    /// Returns `CurrencyMismatch` for different currencies and `Overflow` if
    /// the sum does not fit.
    pub fn checked_add(&self, other: &Self) -> Result<Self, MoneyError> {
        if self.currency_code != other.currency_code {
            return Err(MoneyError::CurrencyMismatch(
                self.currency_code.clone(),
                other.currency_code.clone(),
            ));
        }
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(MoneyError::Overflow)?;
        Ok(Self::new(amount, self.currency_code.clone()))
    }

    /// Multiply by a line quantity.
    ///
    /// # Errors
    ///
    /// Returns `Overflow` if the product does not fit.
    pub fn times(&self, quantity: i64) -> Result<Self, MoneyError> {
        let amount = self
            .amount
            .checked_mul(Decimal::from(quantity))
            .ok_or(MoneyError::Overflow)?;
        Ok(Self::new(amount, self.currency_code.clone()))
    }
}

impl fmt::Display for Money {
    /// Formats as `$12.50 USD`, or `12.50 XOF` when the currency has no symbol.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = self.amount.round_dp(2);
        match self.currency_code.symbol() {
            Some(symbol) => write!(f, "{symbol}{amount:.2} {}", self.currency_code),
            None => write!(f, "{amount:.2} {}", self.currency_code),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn usd(amount: &str) -> Money {
        Money::new(
            Decimal::from_str(amount).unwrap(),
            CurrencyCode::parse("usd").unwrap(),
        )
    }

    #[test]
    fn test_currency_code_normalizes() {
        assert_eq!(CurrencyCode::parse("cad").unwrap().as_str(), "CAD");
        assert!(CurrencyCode::parse("CADX").is_err());
        assert!(CurrencyCode::parse("C4D").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(usd("12.5").to_string(), "$12.50 USD");
        let xof = Money::new(Decimal::from(3), CurrencyCode::parse("XOF").unwrap());
        assert_eq!(xof.to_string(), "3.00 XOF");
    }

    #[test]
    fn test_checked_add() {
        let sum = usd("1.25").checked_add(&usd("2.50")).unwrap();
        assert_eq!(sum, usd("3.75"));

        let eur = Money::new(Decimal::ONE, CurrencyCode::parse("EUR").unwrap());
        assert!(matches!(
            usd("1").checked_add(&eur),
            Err(MoneyError::CurrencyMismatch(_, _))
        ));
    }

    #[test]
    fn test_times() {
        assert_eq!(usd("4.99").times(3).unwrap(), usd("14.97"));
    }

    #[test]
    fn test_serde_amount_as_string() {
        let json = serde_json::to_string(&usd("9.99")).unwrap();
        assert_eq!(json, r#"{"amount":"9.99","currency_code":"USD"}"#);
    }
}
