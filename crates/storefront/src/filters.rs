//! Custom Askama template filters.

use std::fmt::Display;

use rust_decimal::Decimal;
use threadline_core::Price;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a cedi amount, e.g. `GH₵12.50`.
///
/// Usage in templates: `{{ totals.subtotal|cedis }}`
#[askama::filter_fn]
pub fn cedis(amount: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let amount: Decimal = amount
        .to_string()
        .parse()
        .map_err(|e| askama::Error::Custom(Box::new(e)))?;
    Ok(Price::ghs(amount).display())
}
