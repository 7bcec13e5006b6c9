//! Period-over-period change.
//!
//! All rounding in reports goes through [`round_half_away`] so percentages,
//! shares and rates agree on how `.5` is resolved.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub previous_value: Decimal,
    pub current_value: Decimal,
    pub percent_change: i64,
}

impl ComparisonResult {
    #[must_use]
    pub fn new(previous_value: Decimal, current_value: Decimal) -> Self {
        Self {
            previous_value,
            current_value,
            percent_change: percent_change(previous_value, current_value),
        }
    }

    #[must_use]
    pub fn from_counts(previous: i64, current: i64) -> Self {
        Self::new(Decimal::from(previous), Decimal::from(current))
    }
}

/// Whole-number percentage change from `previous` to `current`.
///
/// A zero baseline reports `100` when anything was gained and `0` otherwise.
#[must_use]
pub fn percent_change(previous: Decimal, current: Decimal) -> i64 {
    if previous.is_zero() {
        return if current > Decimal::ZERO { 100 } else { 0 };
    }

    (current - previous)
        .checked_div(previous)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map_or(0, round_half_away)
}

/// `round(part / whole * 100)`, or 0 when `whole` is 0.
#[must_use]
pub fn percentage_of(part: i64, whole: i64) -> i64 {
    if whole == 0 {
        return 0;
    }

    Decimal::from(part)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(Decimal::from(whole)))
        .map_or(0, round_half_away)
}

pub(crate) fn round_half_away(value: Decimal) -> i64 {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or_default()
}
