//! Present value of dividends paid before expiry.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::expiry::{expiry_datetime, whole_days_between, DAYS_PER_YEAR};

/// A cash dividend with its ex-date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dividend {
    pub ex_date: NaiveDateTime,
    pub amount: f64,
}

/// Discounts each dividend with `start < ex_date <= expiry` at `exp(-r t)`.
///
/// `t` is whole days from `start` over a 365.25-day year. Non-finite
/// amounts are skipped.
#[must_use]
pub fn pv_of_dividends(
    dividends: &[Dividend],
    start: NaiveDateTime,
    expiry: NaiveDate,
    rate: f64,
) -> f64 {
    let expiry_at = expiry_datetime(expiry);

    dividends
        .iter()
        .filter(|d| d.ex_date > start && d.ex_date <= expiry_at)
        .filter(|d| d.amount.is_finite())
        .map(|d| {
            let t = (whole_days_between(start, d.ex_date) as f64 / DAYS_PER_YEAR).max(0.0);
            d.amount * (-rate * t).exp()
        })
        .sum()
}
