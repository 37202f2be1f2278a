//! Two-decimal arithmetic for hours and payouts.
//!
//! Every intermediate sum is rounded so that long accumulations cannot drift.

/// ## Summary
/// Rounds to two decimal places, halves away from zero.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// ## Summary
/// Amount owed for one work line: `round2(round2(hours) * rate)`.
#[must_use]
pub fn line_amount(hours: f64, hourly_rate: f64) -> f64 {
    round2(round2(hours) * hourly_rate)
}

/// ## Summary
/// Adds `value` to `total`, rounding the result.
#[must_use]
pub fn add_rounded(total: f64, value: f64) -> f64 {
    round2(total + value)
}
