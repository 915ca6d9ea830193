//! Per-ticker parity pipeline over any `MarketDataSource`.
//!
//! Fetch spot and dividends, pick expiries, resolve the risk-free rate, then
//! evaluate every expiry's joined chain. Row evaluation is pure; only the
//! fetches are async.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use futures::stream::{self, StreamExt, TryStreamExt};
use parity_core::{
    pv_of_dividends, select_expiries, summarize, time_to_expiry_years, AnalysisConfig, Dividend,
    ExpirySummary, MarketContext, ParityEvaluator, ParityRecord,
};
use parity_data::MarketDataSource;

/// Records produced for one expiry.
#[derive(Debug, Clone)]
pub struct ExpiryResult {
    pub expiry: NaiveDate,
    pub records: Vec<ParityRecord>,
}

/// Everything one pipeline run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub ticker: String,
    pub spot: f64,
    pub risk_free_annual: f64,
    pub expiries: Vec<ExpiryResult>,
    pub summaries: Vec<ExpirySummary>,
}

impl PipelineOutput {
    /// All records across expiries, in expiry processing order.
    #[must_use]
    pub fn all_records(&self) -> Vec<ParityRecord> {
        self.expiries
            .iter()
            .flat_map(|e| e.records.iter().cloned())
            .collect()
    }

    /// One-line description of the market inputs used for the run.
    #[must_use]
    pub fn headline(&self) -> String {
        format!(
            "{}: spot {:.2}, risk-free {:.2}%, {} expiries, {} strikes",
            self.ticker,
            self.spot,
            self.risk_free_annual * 100.0,
            self.expiries.len(),
            self.expiries.iter().map(|e| e.records.len()).sum::<usize>()
        )
    }
}

/// Shared inputs for every expiry of one run.
struct ExpiryJob<'a> {
    source: &'a dyn MarketDataSource,
    ticker: &'a str,
    spot: f64,
    rate: f64,
    dividends: &'a [Dividend],
    settings: &'a AnalysisConfig,
    now: NaiveDateTime,
}

impl ExpiryJob<'_> {
    /// Evaluates one expiry. `Ok(None)` when either side of the chain is empty.
    async fn run(&self, expiry: NaiveDate) -> Result<Option<ExpiryResult>> {
        let chain = self
            .source
            .option_chain(self.ticker, expiry)
            .await
            .with_context(|| format!("Failed to load option chain for {} {expiry}", self.ticker))?;

        if chain.is_one_sided() {
            tracing::warn!(
                ticker = self.ticker,
                %expiry,
                calls = chain.calls.len(),
                puts = chain.puts.len(),
                "Skipping expiry with a one-sided chain"
            );
            return Ok(None);
        }

        let tau = time_to_expiry_years(expiry, self.now);
        let pv_div = if self.settings.use_dividends {
            pv_of_dividends(self.dividends, self.now, expiry, self.rate)
        } else {
            0.0
        };

        let context = MarketContext::new(
            self.spot,
            tau,
            self.rate,
            pv_div,
            self.settings.stock_spread_cents,
        )
        .with_context(|| format!("Invalid market context for {expiry}"))?;
        let evaluator = ParityEvaluator::new(context);

        let rows = chain.join();
        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let strike = row
                .validated_strike()
                .with_context(|| format!("Bad chain row for {expiry}"))?;
            let gaps = evaluator.evaluate(row, self.settings.direction_hint)?;
            records.push(ParityRecord::new(strike, row, gaps, expiry, &context));
        }

        tracing::info!(
            ticker = self.ticker,
            %expiry,
            tau_years = tau,
            pv_div,
            strikes = records.len(),
            "Evaluated expiry"
        );

        Ok(Some(ExpiryResult { expiry, records }))
    }
}

/// Runs the full pipeline for one ticker.
///
/// # Errors
/// Fails when no spot history exists, no expiries are selected, a fetch
/// fails, or no rows are produced across all expiries.
pub async fn run_pipeline(
    source: &dyn MarketDataSource,
    ticker: &str,
    explicit_expiries: &[NaiveDate],
    settings: &AnalysisConfig,
    concurrency: usize,
    now: NaiveDateTime,
) -> Result<PipelineOutput> {
    settings.validate()?;
    let ticker = ticker.to_uppercase();

    tracing::info!("[1/4] Fetching spot & dividends for {}", ticker);
    let snapshot = source
        .spot_and_dividends(&ticker)
        .await
        .with_context(|| format!("Failed to fetch spot for {ticker}"))?;

    tracing::info!("[2/4] Picking expiries");
    let available = if explicit_expiries.is_empty() {
        source
            .expiries(&ticker)
            .await
            .with_context(|| format!("Failed to list expiries for {ticker}"))?
    } else {
        Vec::new()
    };
    let expiries = select_expiries(explicit_expiries, &available, &settings.dte_window(), now);
    if expiries.is_empty() {
        bail!("No expiries selected. Try adjusting --min-dte/--max-dte or specify --expiries.");
    }

    tracing::info!("[3/4] Getting risk-free rate");
    let rate = match settings.rf_override {
        Some(rate) => rate,
        None => match source
            .risk_free_rate()
            .await
            .context("Failed to fetch risk-free rate")?
        {
            Some(rate) => rate,
            None => {
                tracing::warn!(
                    fallback = settings.rf_fallback,
                    "No risk-free rate history, using fallback"
                );
                settings.rf_fallback
            }
        },
    };

    tracing::info!(
        "[4/4] Processing {} expiries (spot {:.2}, rf {:.4})",
        expiries.len(),
        snapshot.spot,
        rate
    );
    let job = ExpiryJob {
        source,
        ticker: &ticker,
        spot: snapshot.spot,
        rate,
        dividends: &snapshot.dividends,
        settings,
        now,
    };

    let processed: Vec<Option<ExpiryResult>> = stream::iter(expiries)
        .map(|expiry| job.run(expiry))
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;
    let results: Vec<ExpiryResult> = processed.into_iter().flatten().collect();

    if results.iter().all(|r| r.records.is_empty()) {
        bail!("No option rows produced for {ticker}. (Illiquid ticker/expiry or API limits?)");
    }

    let all: Vec<ParityRecord> = results.iter().flat_map(|r| r.records.iter().cloned()).collect();
    let summaries = summarize(&all);

    Ok(PipelineOutput {
        ticker,
        spot: snapshot.spot,
        risk_free_annual: rate,
        expiries: results,
        summaries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parity_core::{Direction, Quote};
    use parity_data::{DataError, OptionChain, OptionLine, SpotSnapshot};

    struct StubSource {
        spot: f64,
        rate: Option<f64>,
        expiries: Vec<NaiveDate>,
        dividends: Vec<Dividend>,
    }

    fn line(strike: f64, bid: f64, ask: f64) -> OptionLine {
        OptionLine {
            strike,
            quote: Quote::new(Some(bid), Some(ask), None),
            volume: None,
            open_interest: None,
        }
    }

    #[async_trait]
    impl MarketDataSource for StubSource {
        async fn spot_and_dividends(&self, ticker: &str) -> parity_data::Result<SpotSnapshot> {
            Ok(SpotSnapshot {
                ticker: ticker.to_string(),
                spot: self.spot,
                dividends: self.dividends.clone(),
            })
        }

        async fn expiries(&self, _ticker: &str) -> parity_data::Result<Vec<NaiveDate>> {
            Ok(self.expiries.clone())
        }

        async fn option_chain(
            &self,
            ticker: &str,
            expiry: NaiveDate,
        ) -> parity_data::Result<OptionChain> {
            // the second listed expiry only has calls
            let puts = if Some(&expiry) == self.expiries.get(1) {
                vec![]
            } else {
                vec![line(100.0, 2.9, 3.1), line(105.0, 5.0, 5.4)]
            };
            Ok(OptionChain {
                ticker: ticker.to_string(),
                expiry,
                calls: vec![line(100.0, 4.9, 5.1), line(105.0, 2.0, 2.2)],
                puts,
            })
        }

        async fn risk_free_rate(&self) -> parity_data::Result<Option<f64>> {
            Ok(self.rate)
        }
    }

    struct FailingSource;

    #[async_trait]
    impl MarketDataSource for FailingSource {
        async fn spot_and_dividends(&self, ticker: &str) -> parity_data::Result<SpotSnapshot> {
            Err(DataError::no_price_history(ticker))
        }

        async fn expiries(&self, _ticker: &str) -> parity_data::Result<Vec<NaiveDate>> {
            Ok(vec![])
        }

        async fn option_chain(
            &self,
            ticker: &str,
            _expiry: NaiveDate,
        ) -> parity_data::Result<OptionChain> {
            Err(DataError::no_options_data(ticker))
        }

        async fn risk_free_rate(&self) -> parity_data::Result<Option<f64>> {
            Ok(None)
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap()
    }

    fn stub() -> StubSource {
        StubSource {
            spot: 100.0,
            rate: Some(0.05),
            expiries: vec![
                NaiveDate::from_ymd_opt(2026, 3, 20).unwrap(),
                NaiveDate::from_ymd_opt(2026, 4, 17).unwrap(),
                NaiveDate::from_ymd_opt(2026, 5, 15).unwrap(),
            ],
            dividends: vec![],
        }
    }

    #[tokio::test]
    async fn test_pipeline_evaluates_and_skips_one_sided_expiries() {
        let source = stub();
        let out = run_pipeline(&source, "spy", &[], &AnalysisConfig::default(), 2, now())
            .await
            .unwrap();

        assert_eq!(out.ticker, "SPY");
        assert_eq!(out.risk_free_annual, 0.05);
        assert_eq!(out.expiries.len(), 2);
        assert_eq!(out.expiries[0].expiry, source.expiries[0]);
        assert_eq!(out.expiries[1].expiry, source.expiries[2]);
        assert_eq!(out.all_records().len(), 4);
        assert_eq!(out.summaries.len(), 2);
        assert_eq!(
            out.headline(),
            "SPY: spot 100.00, risk-free 5.00%, 2 expiries, 4 strikes"
        );

        let first = &out.expiries[0].records[0];
        assert_eq!(first.strike, 100.0);
        // 17 whole days to 2026-03-20
        assert!((first.tau_years - 17.0 / 365.25).abs() < 1e-12);
        assert!(first.gap_mid.is_some());
    }

    #[tokio::test]
    async fn test_pipeline_uses_override_and_fallback_rates() {
        let source = StubSource { rate: None, ..stub() };

        let fallback = run_pipeline(&source, "SPY", &[], &AnalysisConfig::default(), 1, now())
            .await
            .unwrap();
        assert_eq!(fallback.risk_free_annual, 0.03);

        let settings = AnalysisConfig {
            rf_override: Some(0.01),
            ..AnalysisConfig::default()
        };
        let overridden = run_pipeline(&source, "SPY", &[], &settings, 1, now())
            .await
            .unwrap();
        assert_eq!(overridden.risk_free_annual, 0.01);
        assert_eq!(overridden.all_records()[0].rf_annual, 0.01);
    }

    #[tokio::test]
    async fn test_pipeline_dividends_only_when_enabled() {
        let ex_date = NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let source = StubSource {
            dividends: vec![Dividend { ex_date, amount: 1.0 }],
            ..stub()
        };

        let without = run_pipeline(&source, "SPY", &[], &AnalysisConfig::default(), 1, now())
            .await
            .unwrap();
        assert_eq!(without.all_records()[0].pv_div, 0.0);

        let settings = AnalysisConfig {
            use_dividends: true,
            ..AnalysisConfig::default()
        };
        let with = run_pipeline(&source, "SPY", &[], &settings, 1, now())
            .await
            .unwrap();
        let pv = with.all_records()[0].pv_div;
        assert!(pv > 0.99 && pv < 1.0);
    }

    #[tokio::test]
    async fn test_pipeline_direction_hint_flows_through() {
        let source = stub();
        let settings = AnalysisConfig {
            direction_hint: Some(Direction::PutsRich),
            ..AnalysisConfig::default()
        };
        let hinted = run_pipeline(&source, "SPY", &[], &settings, 1, now())
            .await
            .unwrap();
        let plain = run_pipeline(&source, "SPY", &[], &AnalysisConfig::default(), 1, now())
            .await
            .unwrap();

        let h = &hinted.all_records()[0];
        let p = &plain.all_records()[0];
        assert_eq!(h.gap_mid, p.gap_mid);
        assert_ne!(h.gap_exec, p.gap_exec);
    }

    #[tokio::test]
    async fn test_pipeline_no_expiries_selected() {
        let source = stub();
        let settings = AnalysisConfig {
            min_dte: 400,
            max_dte: 500,
            ..AnalysisConfig::default()
        };
        let err = run_pipeline(&source, "SPY", &[], &settings, 1, now())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No expiries selected"));
    }

    #[tokio::test]
    async fn test_pipeline_no_rows_produced() {
        let source = stub();
        // only the one-sided expiry
        let explicit = vec![source.expiries[1]];
        let err = run_pipeline(&source, "SPY", &explicit, &AnalysisConfig::default(), 1, now())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No option rows produced"));
    }

    #[tokio::test]
    async fn test_pipeline_propagates_source_failure() {
        let err = run_pipeline(&FailingSource, "SPY", &[], &AnalysisConfig::default(), 1, now())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to fetch spot for SPY"));
    }
}
