use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Errors parsing a decimal literal into [`Money`].
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum MoneyParseError {
  #[error("Malformed amount")]
  Malformed,

  #[error("Amount exceeds the supported precision of {} decimals", Money::SCALE)]
  ExceededPrecision,

  #[error("Amount out of range")]
  OutOfRange,
}

/// Fixed-point monetary value stored as an integer number of 10^-4 units.
///
/// All the arithmetic is exact integer arithmetic. [`Decimal`] is only used as
/// the codec to parse and render decimal literals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
  /// Number of decimals after the point
  pub const SCALE: u32 = 4;

  pub const ZERO: Money = Money(0);

  /// Builds a value from its scaled integer representation (1.5 is `15000`)
  pub const fn from_units(units: i64) -> Self {
    Self(units)
  }

  pub fn checked_add(self, rhs: Money) -> Option<Money> {
    self.0.checked_add(rhs.0).map(Money)
  }

  pub fn checked_sub(self, rhs: Money) -> Option<Money> {
    self.0.checked_sub(rhs.0).map(Money)
  }

  pub fn is_negative(&self) -> bool {
    self.0 < 0
  }

  /// Parses a decimal literal like `"12.3456"`.
  /// Trailing zeros beyond the scale are accepted as long as the value is representable exactly.
  pub fn from_decimal_string(text: &str) -> Result<Self, MoneyParseError> {
    let decimal = Decimal::from_str(text.trim()).map_err(|_| MoneyParseError::Malformed)?;
    Money::try_from(decimal)
  }

  pub fn to_decimal(&self) -> Decimal {
    Decimal::new(self.0, Self::SCALE)
  }
}

impl TryFrom<Decimal> for Money {
  type Error = MoneyParseError;

  fn try_from(decimal: Decimal) -> Result<Self, Self::Error> {
    let mut decimal = decimal.normalize();
    if decimal.scale() > Self::SCALE {
      return Err(MoneyParseError::ExceededPrecision);
    }

    decimal.rescale(Self::SCALE);
    if decimal.scale() != Self::SCALE {
      return Err(MoneyParseError::OutOfRange);
    }

    i64::try_from(decimal.mantissa())
      .map(Money)
      .map_err(|_| MoneyParseError::OutOfRange)
  }
}

impl FromStr for Money {
  type Err = MoneyParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Money::from_decimal_string(s)
  }
}

impl fmt::Display for Money {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.to_decimal())
  }
}

impl Serialize for Money {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    serializer.collect_str(self)
  }
}

#[cfg(test)]
pub(crate) fn money(text: &str) -> Money {
  Money::from_decimal_string(text).unwrap()
}
