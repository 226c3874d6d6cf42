//! Monetary amounts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fields::{FieldMap, FieldValue};

/// An amount in minor units (cents) of an ISO 4217 currency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Money {
    /// Three-letter currency code.
    #[serde(default)]
    pub currency: String,
    /// Amount in minor units.
    #[serde(default)]
    pub amount: i64,
}

impl Money {
    /// Creates an amount in the given currency.
    #[must_use]
    pub fn new(amount: i64, currency: impl Into<String>) -> Self {
        Self { currency: currency.into(), amount }
    }

    /// Creates an amount in euros.
    #[must_use]
    pub fn eur(amount: i64) -> Self {
        Self::new(amount, "EUR")
    }

    /// Returns true when the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        write!(f, "{sign}{}.{:02} {}", abs / 100, abs % 100, self.currency)
    }
}

impl From<&Money> for FieldValue {
    fn from(money: &Money) -> Self {
        Self::Object(
            FieldMap::new().with("Currency", money.currency.as_str()).with("Amount", money.amount),
        )
    }
}
