//! Parity check CLI command.
//!
//! Pulls spot, dividends, expiries and chains for a ticker from Yahoo
//! Finance, evaluates every strike, and writes per-expiry, combined and
//! summary CSVs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use parity_core::{now_utc_naive, AnalysisConfig, ConfigLoader, Direction, SummaryFormatter};
use parity_data::{CsvStorage, YahooClient};

use crate::pipeline::{run_pipeline, PipelineOutput};

/// Arguments for the check command.
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Underlying ticker (e.g., SPY, AAPL)
    #[arg(long)]
    pub ticker: String,

    /// Explicit expiries (YYYY-MM-DD). If omitted, use the DTE window.
    #[arg(long, num_args = 1..)]
    pub expiries: Vec<NaiveDate>,

    /// Minimum days to expiry (auto mode)
    #[arg(long)]
    pub min_dte: Option<i64>,

    /// Maximum days to expiry (auto mode)
    #[arg(long)]
    pub max_dte: Option<i64>,

    /// Include PV(dividends) until expiry
    #[arg(long, default_value = "false")]
    pub use_dividends: bool,

    /// Annual risk-free rate override (e.g., 0.045)
    #[arg(long)]
    pub rf_override: Option<f64>,

    /// Assumed stock bid-ask spread (cents)
    #[arg(long)]
    pub stock_spread_cents: Option<f64>,

    /// Force the executable-gap direction (A = calls rich, B = puts rich)
    #[arg(long)]
    pub direction: Option<Direction>,

    /// Output directory (defaults to the configured one)
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Config file path
    #[arg(short, long, env = "PARITY_CONFIG", default_value = parity_core::config_loader::DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Expiry chains fetched concurrently
    #[arg(long, default_value = "4")]
    pub concurrency: usize,
}

impl CheckArgs {
    /// Layers command-line flags over the loaded analysis settings.
    #[must_use]
    pub fn apply(&self, mut settings: AnalysisConfig) -> AnalysisConfig {
        if let Some(min_dte) = self.min_dte {
            settings.min_dte = min_dte;
        }
        if let Some(max_dte) = self.max_dte {
            settings.max_dte = max_dte;
        }
        if self.use_dividends {
            settings.use_dividends = true;
        }
        if self.rf_override.is_some() {
            settings.rf_override = self.rf_override;
        }
        if let Some(spread) = self.stock_spread_cents {
            settings.stock_spread_cents = spread;
        }
        if self.direction.is_some() {
            settings.direction_hint = self.direction;
        }
        settings
    }
}

/// `<out>/<TICKER>/parity_<TICKER>_<expiry>.csv`
#[must_use]
pub fn expiry_csv_path(out: &Path, ticker: &str, expiry: NaiveDate) -> PathBuf {
    out.join(ticker)
        .join(format!("parity_{ticker}_{}.csv", expiry.format("%Y-%m-%d")))
}

/// `<out>/parity_results_<TICKER>.csv`
#[must_use]
pub fn combined_csv_path(out: &Path, ticker: &str) -> PathBuf {
    out.join(format!("parity_results_{ticker}.csv"))
}

/// `<out>/summary_<TICKER>.csv`
#[must_use]
pub fn summary_csv_path(out: &Path, ticker: &str) -> PathBuf {
    out.join(format!("summary_{ticker}.csv"))
}

/// Writes every CSV a run produces.
///
/// # Errors
/// Returns an error if any file cannot be written.
pub fn write_outputs(out: &Path, output: &PipelineOutput) -> Result<()> {
    for result in &output.expiries {
        let path = expiry_csv_path(out, &output.ticker, result.expiry);
        CsvStorage::write_records(&path, &result.records)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    let combined = combined_csv_path(out, &output.ticker);
    CsvStorage::write_records(&combined, &output.all_records())
        .with_context(|| format!("Failed to write {}", combined.display()))?;

    let summary = summary_csv_path(out, &output.ticker);
    CsvStorage::write_summary(&summary, &output.summaries)
        .with_context(|| format!("Failed to write {}", summary.display()))?;

    tracing::info!(
        combined = %combined.display(),
        summary = %summary.display(),
        "Wrote parity results"
    );
    Ok(())
}

/// Runs the check command.
///
/// # Errors
/// Returns an error if configuration is invalid, data retrieval fails, no
/// rows are produced, or outputs cannot be written.
pub async fn run_check(args: CheckArgs) -> Result<()> {
    let config = ConfigLoader::load_from(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config))?;
    let settings = args.apply(config.analysis.clone());
    let out_dir = PathBuf::from(args.output_dir.clone().unwrap_or(config.output.dir.clone()));

    let client = YahooClient::new(&config.yahoo)?;

    let output = run_pipeline(
        &client,
        &args.ticker,
        &args.expiries,
        &settings,
        args.concurrency,
        now_utc_naive(),
    )
    .await?;

    write_outputs(&out_dir, &output)?;
    println!("{}", output.headline());
    println!("{}", SummaryFormatter::format(&output.ticker, &output.summaries));
    tracing::info!("Done. See {} for CSVs.", out_dir.display());

    Ok(())
}
