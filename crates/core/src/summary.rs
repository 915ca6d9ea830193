//! Per-expiry aggregation of parity results.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::record::ParityRecord;

/// One cent, in dollars.
pub const GAP_THRESHOLD_SMALL: f64 = 0.01;
/// Five cents, in dollars.
pub const GAP_THRESHOLD_MEDIUM: f64 = 0.05;

/// Summary statistics for one expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpirySummary {
    pub expiry: NaiveDate,
    pub n_strikes: usize,
    /// Percent of rows with `|gap_mid|` above one cent.
    pub pct_abs_gap_mid_gt_1c: f64,
    /// Percent of rows with `|gap_mid|` above five cents.
    pub pct_abs_gap_mid_gt_5c: f64,
    /// Percent of rows with a positive executable gap.
    pub pct_gap_exec_pos: f64,
    /// Mean `|gap_mid|` over rows where it is known.
    pub avg_abs_gap_mid: Option<f64>,
    /// Max `|gap_mid|` over rows where it is known.
    pub max_abs_gap_mid: Option<f64>,
}

fn pct(hits: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * hits as f64 / total as f64
    }
}

impl ExpirySummary {
    /// Aggregates rows that all belong to `expiry`.
    ///
    /// Rows with an unknown mid gap count toward the percentage
    /// denominators but not toward the mean or max.
    #[must_use]
    pub fn from_records(expiry: NaiveDate, records: &[&ParityRecord]) -> Self {
        let n = records.len();
        let abs_gaps: Vec<f64> = records
            .iter()
            .filter_map(|r| r.gap_mid.map(f64::abs))
            .collect();

        let above = |threshold: f64| abs_gaps.iter().filter(|g| **g > threshold).count();
        let exec_pos = records.iter().filter(|r| r.gap_exec > 0.0).count();

        let avg = if abs_gaps.is_empty() {
            None
        } else {
            Some(abs_gaps.iter().sum::<f64>() / abs_gaps.len() as f64)
        };
        let max = abs_gaps.iter().copied().reduce(f64::max);

        Self {
            expiry,
            n_strikes: n,
            pct_abs_gap_mid_gt_1c: pct(above(GAP_THRESHOLD_SMALL), n),
            pct_abs_gap_mid_gt_5c: pct(above(GAP_THRESHOLD_MEDIUM), n),
            pct_gap_exec_pos: pct(exec_pos, n),
            avg_abs_gap_mid: avg,
            max_abs_gap_mid: max,
        }
    }
}

/// Groups records by expiry (ascending) and summarizes each group.
#[must_use]
pub fn summarize(records: &[ParityRecord]) -> Vec<ExpirySummary> {
    let mut groups: BTreeMap<NaiveDate, Vec<&ParityRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.expiry).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(expiry, group)| ExpirySummary::from_records(expiry, &group))
        .collect()
}
