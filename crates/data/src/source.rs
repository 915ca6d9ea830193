//! Market data source abstraction and option chain shapes.

use async_trait::async_trait;
use chrono::NaiveDate;
use parity_core::{ChainRow, Dividend, Quote};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Spot price plus known dividend history for an underlying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotSnapshot {
    pub ticker: String,
    pub spot: f64,
    pub dividends: Vec<Dividend>,
}

/// One listed contract (call or put) at a strike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionLine {
    pub strike: f64,
    pub quote: Quote,
    pub volume: Option<u64>,
    pub open_interest: Option<u64>,
}

/// Calls and puts for one expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChain {
    pub ticker: String,
    pub expiry: NaiveDate,
    pub calls: Vec<OptionLine>,
    pub puts: Vec<OptionLine>,
}

impl OptionChain {
    /// True when either side has no contracts.
    #[must_use]
    pub fn is_one_sided(&self) -> bool {
        self.calls.is_empty() || self.puts.is_empty()
    }

    /// Inner join of calls and puts on strike, in call order.
    ///
    /// Strikes listed only on one side are dropped. When a strike is listed
    /// more than once on the put side the first listing wins.
    #[must_use]
    pub fn join(&self) -> Vec<ChainRow> {
        self.calls
            .iter()
            .filter_map(|call| {
                let put = self.puts.iter().find(|p| p.strike == call.strike)?;
                Some(ChainRow {
                    strike: Some(call.strike),
                    call: call.quote,
                    put: put.quote,
                    call_volume: call.volume,
                    call_open_interest: call.open_interest,
                    put_volume: put.volume,
                    put_open_interest: put.open_interest,
                })
            })
            .collect()
    }
}

/// Upstream provider of everything the parity pipeline consumes.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Latest close and dividend history.
    async fn spot_and_dividends(&self, ticker: &str) -> Result<SpotSnapshot>;

    /// Listed option expiries, in listing order.
    async fn expiries(&self, ticker: &str) -> Result<Vec<NaiveDate>>;

    /// Option chain for one expiry.
    async fn option_chain(&self, ticker: &str, expiry: NaiveDate) -> Result<OptionChain>;

    /// Annualized risk-free rate; `Ok(None)` when the source has no data.
    async fn risk_free_rate(&self) -> Result<Option<f64>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(strike: f64, bid: f64, ask: f64) -> OptionLine {
        OptionLine {
            strike,
            quote: Quote::new(Some(bid), Some(ask), None),
            volume: Some(10),
            open_interest: None,
        }
    }

    #[test]
    fn test_join_keeps_common_strikes_in_call_order() {
        let chain = OptionChain {
            ticker: "SPY".to_string(),
            expiry: NaiveDate::from_ymd_opt(2026, 4, 17).unwrap(),
            calls: vec![line(110.0, 1.0, 1.1), line(100.0, 5.0, 5.2), line(90.0, 11.0, 11.3)],
            puts: vec![line(90.0, 0.5, 0.6), line(100.0, 3.0, 3.2), line(120.0, 20.0, 20.5)],
        };

        let rows = chain.join();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].strike, Some(100.0));
        assert_eq!(rows[0].call.bid, Some(5.0));
        assert_eq!(rows[0].put.ask, Some(3.2));
        assert_eq!(rows[1].strike, Some(90.0));
        assert_eq!(rows[1].put_volume, Some(10));
    }

    #[test]
    fn test_one_sided_chain() {
        let chain = OptionChain {
            ticker: "XYZ".to_string(),
            expiry: NaiveDate::from_ymd_opt(2026, 4, 17).unwrap(),
            calls: vec![line(10.0, 1.0, 1.1)],
            puts: vec![],
        };
        assert!(chain.is_one_sided());
        assert!(chain.join().is_empty());
    }
}
