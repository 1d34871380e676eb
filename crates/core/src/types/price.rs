//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (cedis, not pesewas).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in Ghana cedis.
    #[must_use]
    pub const fn ghs(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::GHS)
    }

    /// Format for display, rounded half-up to two places (e.g., "GH₵19.99").
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        format!("{}{rounded:.2}", self.currency_code.symbol())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    GHS,
    USD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::GHS => "GH₵",
            Self::USD => "$",
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_display_pads_to_two_places() {
        assert_eq!(Price::ghs(dec!(27.5)).display(), "GH₵27.50");
        assert_eq!(Price::ghs(dec!(8)).to_string(), "GH₵8.00");
    }

    #[test]
    fn test_display_rounds_half_up() {
        assert_eq!(Price::ghs(dec!(2.345)).display(), "GH₵2.35");
        assert_eq!(Price::new(dec!(1.004), CurrencyCode::USD).display(), "$1.00");
    }

    #[test]
    fn test_default_currency_is_cedi() {
        assert_eq!(CurrencyCode::default(), CurrencyCode::GHS);
    }
}
