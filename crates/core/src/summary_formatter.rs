#![allow(clippy::format_push_string)]

use crate::summary::ExpirySummary;

pub struct SummaryFormatter;

impl SummaryFormatter {
    #[must_use]
    pub fn format(ticker: &str, summaries: &[ExpirySummary]) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════════════════\n");
        output.push_str(&format!("                    PUT-CALL PARITY SUMMARY: {ticker}\n"));
        output.push_str("═══════════════════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output.push_str(&format!(
            "{:<12} {:>8} {:>10} {:>10} {:>11} {:>11} {:>11}\n",
            "Expiry", "Strikes", "|Δmid|>1c", "|Δmid|>5c", "Δexec>0", "avg|Δmid|", "max|Δmid|"
        ));
        output.push_str("───────────────────────────────────────────────────────────────────────────\n");

        for s in summaries {
            output.push_str(&format!(
                "{:<12} {:>8} {:>9.1}% {:>9.1}% {:>10.1}% {:>11} {:>11}\n",
                s.expiry.format("%Y-%m-%d"),
                s.n_strikes,
                s.pct_abs_gap_mid_gt_1c,
                s.pct_abs_gap_mid_gt_5c,
                s.pct_gap_exec_pos,
                Self::dollars(s.avg_abs_gap_mid),
                Self::dollars(s.max_abs_gap_mid),
            ));
        }

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════════════════\n");

        if summaries.is_empty() {
            output.push_str("\nNo expiries were evaluated.\n\n");
        }

        output
    }

    fn dollars(value: Option<f64>) -> String {
        value.map_or_else(|| "N/A".to_string(), |v| format!("${v:.4}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_format_lists_each_expiry() {
        let summaries = vec![ExpirySummary {
            expiry: NaiveDate::from_ymd_opt(2026, 4, 17).unwrap(),
            n_strikes: 42,
            pct_abs_gap_mid_gt_1c: 50.0,
            pct_abs_gap_mid_gt_5c: 10.0,
            pct_gap_exec_pos: 2.5,
            avg_abs_gap_mid: Some(0.0312),
            max_abs_gap_mid: None,
        }];

        let text = SummaryFormatter::format("SPY", &summaries);
        assert!(text.contains("SPY"));
        assert!(text.contains("2026-04-17"));
        assert!(text.contains("42"));
        assert!(text.contains("$0.0312"));
        assert!(text.contains("N/A"));
    }

    #[test]
    fn test_format_empty() {
        let text = SummaryFormatter::format("SPY", &[]);
        assert!(text.contains("No expiries were evaluated"));
    }
}
