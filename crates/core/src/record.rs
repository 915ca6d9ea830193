//! Flat per-strike result record, the unit of export and summary.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::context::MarketContext;
use crate::evaluator::{ChainRow, ParityGaps};

/// One evaluated strike with its inputs and market context.
///
/// Kept flat so it serializes straight to a CSV row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParityRecord {
    pub strike: f64,
    pub call_bid: Option<f64>,
    pub call_ask: Option<f64>,
    pub call_last: Option<f64>,
    pub call_volume: Option<u64>,
    pub call_open_interest: Option<u64>,
    pub put_bid: Option<f64>,
    pub put_ask: Option<f64>,
    pub put_last: Option<f64>,
    pub put_volume: Option<u64>,
    pub put_open_interest: Option<u64>,
    pub gap_mid: Option<f64>,
    pub gap_exec: f64,
    pub expiry: NaiveDate,
    pub tau_years: f64,
    pub rf_annual: f64,
    pub pv_div: f64,
}

impl ParityRecord {
    /// Joins a row, its gaps and the expiry context.
    ///
    /// `strike` is the validated strike returned by the evaluator path.
    #[must_use]
    pub fn new(
        strike: f64,
        row: &ChainRow,
        gaps: ParityGaps,
        expiry: NaiveDate,
        context: &MarketContext,
    ) -> Self {
        Self {
            strike,
            call_bid: row.call.bid,
            call_ask: row.call.ask,
            call_last: row.call.last,
            call_volume: row.call_volume,
            call_open_interest: row.call_open_interest,
            put_bid: row.put.bid,
            put_ask: row.put.ask,
            put_last: row.put.last,
            put_volume: row.put_volume,
            put_open_interest: row.put_open_interest,
            gap_mid: gaps.gap_mid,
            gap_exec: gaps.gap_exec,
            expiry,
            tau_years: context.tau_years,
            rf_annual: context.risk_free_annual,
            pv_div: context.pv_dividends,
        }
    }
}
