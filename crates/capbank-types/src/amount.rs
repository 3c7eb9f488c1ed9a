//! Amount types with 18-decimal whole units
//!
//! capbank stores every amount as an unsigned count of base units, where one
//! whole unit of the native currency is `10^18` base units. The withdrawal
//! ceiling alone (50 whole units) does not fit in a `u64`, so the raw value
//! is a `u128`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Decimal places of one whole unit
pub const DECIMALS: u32 = 18;

/// Base units per whole unit
pub const UNIT: u128 = 1_000_000_000_000_000_000;

/// Maximum amount withdrawable in a single operation (50 whole units)
pub const WITHDRAW_LIMIT: Amount = Amount(50 * UNIT);

/// Errors produced when parsing a decimal amount
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountParseError {
    #[error("Amount is empty")]
    Empty,

    #[error("Invalid amount: {input}")]
    Invalid { input: String },

    #[error("Amount {input} has more than {max} fractional digits", max = DECIMALS)]
    TooPrecise { input: String },

    #[error("Amount {input} overflows the base-unit range")]
    Overflow { input: String },
}

/// Unsigned amount in base units
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(pub u128);

impl Amount {
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Create from raw base units
    pub const fn new(base_units: u128) -> Self {
        Self(base_units)
    }

    /// Create from whole units (`units(3)` is `3 * 10^18` base units)
    pub const fn units(whole: u64) -> Self {
        Self(whole as u128 * UNIT)
    }

    pub fn base_units(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Parse a decimal string of whole units, e.g. `"12.5"`
    pub fn parse_units(input: &str) -> Result<Self, AmountParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AmountParseError::Empty);
        }

        let (whole, frac) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty()) || !is_digits(whole) || !is_digits(frac) {
            return Err(AmountParseError::Invalid {
                input: trimmed.to_string(),
            });
        }
        if frac.len() > DECIMALS as usize {
            return Err(AmountParseError::TooPrecise {
                input: trimmed.to_string(),
            });
        }

        let overflow = || AmountParseError::Overflow {
            input: trimmed.to_string(),
        };

        let whole_value: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };
        let frac_value: u128 = if frac.is_empty() {
            0
        } else {
            // at most 18 digits, always fits
            let digits: u128 = frac.parse().map_err(|_| overflow())?;
            digits * 10u128.pow(DECIMALS - frac.len() as u32)
        };

        whole_value
            .checked_mul(UNIT)
            .and_then(|v| v.checked_add(frac_value))
            .map(Self)
            .ok_or_else(overflow)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / UNIT;
        let frac = self.0 % UNIT;
        if frac == 0 {
            write!(f, "{}", whole)
        } else {
            let digits = format!("{:018}", frac);
            write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
        }
    }
}

impl FromStr for Amount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_units(s)
    }
}

// Base units travel as decimal strings; JSON numbers cannot hold a u128.
impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<u128>()
            .map(Self)
            .map_err(|e| serde::de::Error::custom(format!("invalid base-unit amount {raw:?}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_withdraw_limit_is_fifty_units() {
        assert_eq!(WITHDRAW_LIMIT, Amount::units(50));
        assert_eq!(WITHDRAW_LIMIT.base_units(), 50_000_000_000_000_000_000);
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(Amount::parse_units("60").unwrap(), Amount::units(60));
        assert_eq!(
            Amount::parse_units("12.5").unwrap(),
            Amount::new(12 * UNIT + UNIT / 2)
        );
        assert_eq!(Amount::parse_units(".25").unwrap(), Amount::new(UNIT / 4));
        assert_eq!(
            Amount::parse_units("0.000000000000000001").unwrap(),
            Amount::new(1)
        );
    }

    #[test]
    fn test_parse_units_rejects_garbage() {
        assert_eq!(Amount::parse_units("  "), Err(AmountParseError::Empty));
        assert!(matches!(
            Amount::parse_units("."),
            Err(AmountParseError::Invalid { .. })
        ));
        assert!(matches!(
            Amount::parse_units("-3"),
            Err(AmountParseError::Invalid { .. })
        ));
        assert!(matches!(
            Amount::parse_units("1.0000000000000000001"),
            Err(AmountParseError::TooPrecise { .. })
        ));
        assert!(matches!(
            Amount::parse_units("999999999999999999999999999999999"),
            Err(AmountParseError::Overflow { .. })
        ));
    }

    #[test]
    fn test_display_trims_fraction() {
        assert_eq!(Amount::units(60).to_string(), "60");
        assert_eq!(Amount::new(10 * UNIT + UNIT / 2).to_string(), "10.5");
        assert_eq!(Amount::new(1).to_string(), "0.000000000000000001");
        assert_eq!(Amount::zero().to_string(), "0");
    }

    #[test]
    fn test_serde_uses_base_unit_strings() {
        let json = serde_json::to_string(&WITHDRAW_LIMIT).unwrap();
        assert_eq!(json, "\"50000000000000000000\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, WITHDRAW_LIMIT);
        assert!(serde_json::from_str::<Amount>("\"12.5\"").is_err());
    }

    #[test]
    fn test_checked_arithmetic() {
        assert_eq!(Amount::new(u128::MAX).checked_add(Amount::new(1)), None);
        assert_eq!(Amount::units(1).checked_sub(Amount::units(2)), None);
        assert_eq!(
            Amount::units(3).checked_sub(Amount::units(1)),
            Some(Amount::units(2))
        );
    }
}
