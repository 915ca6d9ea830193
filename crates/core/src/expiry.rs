//! Expiry calendar helpers: days to expiry, year fractions, selection.

use chrono::{NaiveDate, NaiveDateTime, Utc};

/// Day count used for every year fraction.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Cap on auto-selected expiries.
pub const DEFAULT_MAX_EXPIRIES: usize = 20;

/// Current UTC wall-clock time without a zone.
#[must_use]
pub fn now_utc_naive() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Expiry date as midnight.
#[must_use]
pub fn expiry_datetime(expiry: NaiveDate) -> NaiveDateTime {
    expiry.and_time(chrono::NaiveTime::MIN)
}

/// Whole days from `from` to `to`, rounded toward negative infinity.
#[must_use]
pub fn whole_days_between(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    (to - from).num_seconds().div_euclid(86_400)
}

/// Whole days from `now` until midnight of `expiry`.
#[must_use]
pub fn days_to_expiry(expiry: NaiveDate, now: NaiveDateTime) -> i64 {
    whole_days_between(now, expiry_datetime(expiry))
}

/// Year fraction to expiry, `max(days, 0) / 365.25`.
#[must_use]
pub fn time_to_expiry_years(expiry: NaiveDate, now: NaiveDateTime) -> f64 {
    days_to_expiry(expiry, now).max(0) as f64 / DAYS_PER_YEAR
}

/// DTE window used when no explicit expiries are given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DteWindow {
    pub min_dte: i64,
    pub max_dte: i64,
    pub max_expiries: usize,
}

impl Default for DteWindow {
    fn default() -> Self {
        Self {
            min_dte: 7,
            max_dte: 120,
            max_expiries: DEFAULT_MAX_EXPIRIES,
        }
    }
}

/// Picks the expiries to process.
///
/// An explicit list is returned untouched. Otherwise keeps the listed
/// expiries whose DTE falls inside the window, in listing order, truncated
/// to `max_expiries`.
#[must_use]
pub fn select_expiries(
    explicit: &[NaiveDate],
    available: &[NaiveDate],
    window: &DteWindow,
    now: NaiveDateTime,
) -> Vec<NaiveDate> {
    if !explicit.is_empty() {
        return explicit.to_vec();
    }

    available
        .iter()
        .copied()
        .filter(|e| {
            let dte = days_to_expiry(*e, now);
            dte >= window.min_dte && dte <= window.max_dte
        })
        .take(window.max_expiries)
        .collect()
}
