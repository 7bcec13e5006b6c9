//! Reporting windows.
//!
//! A request names a length in days; the current window ends at `now` and the
//! comparison window is the equal-length span immediately before it. Both are
//! half-open `[start, end)` in UTC.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use saddlery_db::RangeFilter;
use serde::Serialize;

pub const DEFAULT_PERIOD_DAYS: i64 = 30;

/// Upper clamp so `now - 2 * days` can never leave chrono's range.
pub const MAX_PERIOD_DAYS: i64 = 36_500;

/// Months covered by the revenue and customer-growth series, current month included.
pub const TRAILING_MONTHS: u32 = 12;

/// Parse the `period` query value.
///
/// Missing, non-numeric, zero and negative values fall back to
/// [`DEFAULT_PERIOD_DAYS`]; oversized values are clamped to [`MAX_PERIOD_DAYS`].
#[must_use]
pub fn parse_period_days(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|days| *days > 0)
        .map_or(DEFAULT_PERIOD_DAYS, |days| days.min(MAX_PERIOD_DAYS))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub length_days: i64,
}

impl Period {
    #[must_use]
    pub fn filter(&self) -> RangeFilter {
        RangeFilter::between(self.start, self.end)
    }

    /// The trailing calendar-month window ending at `now`: from the first day
    /// of the month `TRAILING_MONTHS - 1` months back, so the current month is
    /// the last bucket.
    #[must_use]
    pub fn trailing_months(now: DateTime<Utc>) -> Self {
        let month_start = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
            .and_then(|d| d.checked_sub_months(Months::new(TRAILING_MONTHS - 1)))
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map_or(now, |dt| dt.and_utc());

        Self {
            start: month_start,
            end: now,
            length_days: (now - month_start).num_days(),
        }
    }
}

/// The current window and its equal-length predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindows {
    pub current: Period,
    pub previous: Period,
}

impl PeriodWindows {
    #[must_use]
    pub fn ending_at(period_days: i64, now: DateTime<Utc>) -> Self {
        let days = period_days.clamp(1, MAX_PERIOD_DAYS);
        let span = Duration::days(days);
        let current_start = now - span;

        Self {
            current: Period {
                start: current_start,
                end: now,
                length_days: days,
            },
            previous: Period {
                start: current_start - span,
                end: current_start,
                length_days: days,
            },
        }
    }
}
