//! Offline evaluate command.
//!
//! Evaluates a chain CSV against a market context given on the command line.
//! No network access.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Args;
use parity_core::{
    now_utc_naive, summarize, time_to_expiry_years, Direction, MarketContext, ParityEvaluator,
    ParityRecord, SummaryFormatter, DEFAULT_STOCK_SPREAD_CENTS,
};
use parity_data::CsvStorage;

/// Arguments for the evaluate command.
#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    /// Chain CSV (strike,call_bid,call_ask,call_last,put_bid,put_ask,put_last)
    #[arg(long)]
    pub chain: String,

    /// Ticker used in the output file name and summary
    #[arg(long, default_value = "CHAIN")]
    pub ticker: String,

    /// Expiry date of the chain (YYYY-MM-DD)
    #[arg(long)]
    pub expiry: NaiveDate,

    /// Spot price of the underlying
    #[arg(long)]
    pub spot: f64,

    /// Annual risk-free rate (e.g., 0.045)
    #[arg(long)]
    pub rf: f64,

    /// Time to expiry in years (defaults to whole days from now / 365.25)
    #[arg(long)]
    pub tau_years: Option<f64>,

    /// Present value of dividends through expiry
    #[arg(long, default_value = "0.0")]
    pub pv_div: f64,

    /// Assumed stock bid-ask spread (cents)
    #[arg(long, default_value_t = DEFAULT_STOCK_SPREAD_CENTS)]
    pub stock_spread_cents: f64,

    /// Force the executable-gap direction (A = calls rich, B = puts rich)
    #[arg(long)]
    pub direction: Option<Direction>,

    /// Output CSV path
    #[arg(short, long)]
    pub output: Option<String>,
}

impl EvaluateArgs {
    /// Market context described by the flags.
    ///
    /// # Errors
    /// Returns an error if any value is out of range.
    pub fn context(&self) -> Result<MarketContext> {
        let tau = self
            .tau_years
            .unwrap_or_else(|| time_to_expiry_years(self.expiry, now_utc_naive()));
        Ok(MarketContext::new(
            self.spot,
            tau,
            self.rf,
            self.pv_div,
            self.stock_spread_cents,
        )?)
    }

    fn output_path(&self) -> PathBuf {
        self.output.as_ref().map_or_else(
            || {
                PathBuf::from("outputs").join(format!(
                    "parity_{}_{}.csv",
                    self.ticker,
                    self.expiry.format("%Y-%m-%d")
                ))
            },
            PathBuf::from,
        )
    }
}

/// Evaluates every row of a chain file.
///
/// # Errors
/// Returns an error if the file cannot be read, it has no rows, or a row has
/// no usable strike.
pub fn evaluate_file(
    path: &Path,
    expiry: NaiveDate,
    context: &MarketContext,
    hint: Option<Direction>,
) -> Result<Vec<ParityRecord>> {
    let rows = CsvStorage::read_chain(path)
        .with_context(|| format!("Failed to read chain from {}", path.display()))?;
    if rows.is_empty() {
        bail!("No option rows in {}", path.display());
    }

    let evaluator = ParityEvaluator::new(*context);
    rows.iter()
        .enumerate()
        .map(|(i, row)| -> Result<ParityRecord> {
            let strike = row
                .validated_strike()
                .with_context(|| format!("Row {} of {}", i + 1, path.display()))?;
            let gaps = evaluator.evaluate(row, hint)?;
            Ok(ParityRecord::new(strike, row, gaps, expiry, context))
        })
        .collect()
}

/// Runs the evaluate command.
///
/// # Errors
/// Returns an error if the context is invalid or reading/writing fails.
pub fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    let context = args.context()?;
    tracing::info!(
        chain = %args.chain,
        spot = context.spot,
        tau_years = context.tau_years,
        rf = context.risk_free_annual,
        "Evaluating chain file"
    );

    let records = evaluate_file(Path::new(&args.chain), args.expiry, &context, args.direction)?;

    let output = args.output_path();
    CsvStorage::write_records(&output, &records)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let ticker = args.ticker.to_uppercase();
    println!("{}", SummaryFormatter::format(&ticker, &summarize(&records)));
    tracing::info!("Wrote {} rows to {}", records.len(), output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_chain(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("chain.csv");
        std::fs::write(&path, body).unwrap();
        path
    }

    fn context() -> MarketContext {
        MarketContext::new(100.0, 0.25, 0.05, 0.0, 1.0).unwrap()
    }

    #[test]
    fn test_evaluate_file_matches_reference_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_chain(
            dir.path(),
            "strike,call_bid,call_ask,call_last,put_bid,put_ask,put_last\n\
             100,4.9,5.1,,2.9,3.1,\n\
             100,,,,,,\n",
        );
        let expiry = NaiveDate::from_ymd_opt(2026, 6, 19).unwrap();

        let records = evaluate_file(&path, expiry, &context(), None).unwrap();
        assert_eq!(records.len(), 2);
        assert!((records[0].gap_mid.unwrap() - 0.7578).abs() < 1e-4);
        assert!((records[0].gap_exec - 0.5528).abs() < 1e-4);
        assert_eq!(records[1].gap_mid, None);
        assert_eq!(records[1].gap_exec, 0.0);
    }

    #[test]
    fn test_evaluate_file_rejects_missing_strike() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_chain(dir.path(), "strike,call_bid\n100,1.0\n,2.0\n");
        let expiry = NaiveDate::from_ymd_opt(2026, 6, 19).unwrap();

        let err = evaluate_file(&path, expiry, &context(), None).unwrap_err();
        assert!(err.to_string().contains("Row 2"));
    }

    #[test]
    fn test_evaluate_file_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_chain(dir.path(), "strike,call_bid\n");
        let expiry = NaiveDate::from_ymd_opt(2026, 6, 19).unwrap();
        assert!(evaluate_file(&path, expiry, &context(), None).is_err());
    }

    #[test]
    fn test_context_from_flags() {
        let args = EvaluateArgs {
            chain: "chain.csv".to_string(),
            ticker: "spy".to_string(),
            expiry: NaiveDate::from_ymd_opt(2026, 6, 19).unwrap(),
            spot: 100.0,
            rf: 0.05,
            tau_years: Some(0.25),
            pv_div: 0.0,
            stock_spread_cents: 1.0,
            direction: None,
            output: None,
        };
        let ctx = args.context().unwrap();
        assert_eq!(ctx.tau_years, 0.25);
        assert_eq!(
            args.output_path(),
            PathBuf::from("outputs/parity_spy_2026-06-19.csv")
        );

        let bad = EvaluateArgs { spot: -1.0, ..args };
        assert!(bad.context().is_err());
    }
}
