//! Monetary amounts and free-text parsing for the add-expense flow.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::constants::MAX_AMOUNT_CENTS;

/// A positive amount with exactly two fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    /// Builds an amount from integer cents, rejecting values outside `(0, MAX]`.
    pub fn from_cents(cents: i64) -> Option<Self> {
        if cents <= 0 || cents > MAX_AMOUNT_CENTS {
            return None;
        }
        Some(Amount(Decimal::new(cents, 2)))
    }

    pub fn cents(&self) -> i64 {
        // scale is pinned to 2 and the value is bounded by MAX_AMOUNT_CENTS
        self.0.mantissa() as i64
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Parses user input such as `23.50` or `23,5` into an [`Amount`].
///
/// Values are rounded half-to-even to two decimals before the positivity
/// check, so `0.004` is rejected.
pub fn parse_amount(text: &str) -> Option<Amount> {
    let normalized = text.trim().replace(',', ".");
    if normalized.is_empty() {
        return None;
    }

    let value = Decimal::from_str(&normalized).ok()?;
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(2);

    let cents = i64::try_from(rounded.mantissa()).ok()?;
    Amount::from_cents(cents)
}

/// Collapses whitespace runs and trims; `None` when nothing is left.
pub fn normalize_title(text: &str) -> Option<String> {
    let title = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if title.is_empty() { None } else { Some(title) }
}
