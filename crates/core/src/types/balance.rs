//! Monetary balance using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A customer's stored-value balance.
///
/// Balances are read-only from the client's perspective: they are created at
/// zero when a profile is inserted and mutated only by the payment backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Balance(Decimal);

impl Balance {
    /// A zero balance, the initial value for every new profile.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a balance from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl From<Decimal> for Balance {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_default() {
        assert_eq!(Balance::default(), Balance::ZERO);
    }

    #[test]
    fn test_display() {
        let balance = Balance::new(Decimal::new(1250, 2));
        assert_eq!(balance.to_string(), "$12.50");
        assert_eq!(Balance::ZERO.to_string(), "$0.00");
    }

    #[test]
    fn test_serde_roundtrip() {
        let balance = Balance::new(Decimal::new(999, 2));
        let json = serde_json::to_string(&balance).unwrap();
        let parsed: Balance = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, balance);
    }
}
