//! Yahoo Finance client with rate limiting.
//!
//! Uses the public chart endpoint for price and dividend history and the
//! options endpoint for expiries and chains. Yahoo data is delayed and meant
//! for research use.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use parity_core::{Dividend, Quote, YahooConfig};
use reqwest::Client;
use serde::Deserialize;

use crate::error::{DataError, Result};
use crate::source::{MarketDataSource, OptionChain, OptionLine, SpotSnapshot};

/// Yahoo Finance API base URL.
pub const YAHOO_API_URL: &str = "https://query1.finance.yahoo.com";

/// 13-week T-bill yield index, quoted in percent.
pub const RISK_FREE_SYMBOL: &str = "^IRX";

/// Days of daily history used to find the latest close.
const SPOT_LOOKBACK: &str = "5d";

/// Days of daily history used to find the latest T-bill yield.
const RATE_LOOKBACK: &str = "10d";

/// Yahoo Finance client.
pub struct YahooClient {
    http: Client,
    base_url: String,
    rate_limiter: Arc<
        RateLimiter<
            governor::state::NotKeyed,
            governor::state::InMemoryState,
            governor::clock::DefaultClock,
        >,
    >,
}

impl std::fmt::Debug for YahooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl YahooClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &YahooConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| DataError::Network(format!("failed to build HTTP client: {e}")))?;

        let per_minute = NonZeroU32::new(config.requests_per_minute).unwrap_or(nonzero!(60u32));
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)));

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            rate_limiter,
        })
    }

    /// Sets a custom base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Rejects tickers that could escape the URL path.
    ///
    /// Allows alphanumerics plus `^`, `.`, `-` and `=` (index, class-share and
    /// FX symbols).
    fn validate_ticker(ticker: &str) -> Result<&str> {
        if ticker.is_empty() {
            return Err(DataError::InvalidTicker("ticker cannot be empty".to_string()));
        }
        if ticker.contains("..") {
            return Err(DataError::InvalidTicker(format!(
                "contains forbidden characters: {ticker}"
            )));
        }
        if !ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '^' | '.' | '-' | '='))
        {
            return Err(DataError::InvalidTicker(format!(
                "must contain only alphanumeric, '^', '.', '-' or '=': {ticker}"
            )));
        }
        if ticker.len() > 16 {
            return Err(DataError::InvalidTicker(format!(
                "exceeds maximum length of 16: {}",
                ticker.len()
            )));
        }
        Ok(ticker)
    }

    /// Waits for rate limit and makes a GET request.
    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(DataError::rate_limit(retry_after));
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(DataError::api(status.as_u16(), text));
        }

        let body = response.json::<T>().await?;
        Ok(body)
    }

    async fn chart(&self, symbol: &str, range: &str, interval: &str) -> Result<Option<RawChart>> {
        let symbol = Self::validate_ticker(symbol)?;
        let path = format!(
            "/v8/finance/chart/{}?range={}&interval={}&events=div",
            urlencoding::encode(symbol),
            range,
            interval
        );

        let response: RawChartResponse = self.get(&path).await?;
        Ok(response.chart.result.and_then(|r| r.into_iter().next()))
    }

    async fn options(&self, ticker: &str, date: Option<i64>) -> Result<RawOptionChainData> {
        let ticker = Self::validate_ticker(ticker)?;
        let path = match date {
            Some(ts) => format!("/v7/finance/options/{}?date={}", urlencoding::encode(ticker), ts),
            None => format!("/v7/finance/options/{}", urlencoding::encode(ticker)),
        };

        let response: RawOptionsResponse = self.get(&path).await?;
        response
            .option_chain
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| DataError::no_options_data(ticker))
    }

    /// Latest close and full dividend history.
    ///
    /// # Errors
    /// Returns `DataError::NoPriceHistory` when the recent history has no
    /// close, or any transport error.
    pub async fn get_spot_and_dividends(&self, ticker: &str) -> Result<SpotSnapshot> {
        let history = self
            .chart(ticker, SPOT_LOOKBACK, "1d")
            .await?
            .ok_or_else(|| DataError::no_price_history(ticker))?;
        let spot = history
            .last_close()
            .ok_or_else(|| DataError::no_price_history(ticker))?;

        let dividends = self
            .chart(ticker, "max", "1mo")
            .await?
            .map(|c| c.dividends())
            .unwrap_or_default();

        tracing::debug!(ticker, spot, dividends = dividends.len(), "Fetched spot and dividends");

        Ok(SpotSnapshot {
            ticker: ticker.to_string(),
            spot,
            dividends,
        })
    }

    /// Listed expiries.
    ///
    /// # Errors
    /// Returns error if the API call fails.
    pub async fn get_expiries(&self, ticker: &str) -> Result<Vec<NaiveDate>> {
        let data = self.options(ticker, None).await?;
        Ok(data
            .expiration_dates
            .unwrap_or_default()
            .iter()
            .filter_map(|&ts| DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive()))
            .collect())
    }

    /// Option chain for one expiry.
    ///
    /// # Errors
    /// Returns error if the API call fails or the response has no chain.
    pub async fn get_option_chain(&self, ticker: &str, expiry: NaiveDate) -> Result<OptionChain> {
        let ts = expiry
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp();
        let data = self.options(ticker, Some(ts)).await?;

        let (calls, puts) = data
            .options
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|o| (convert_lines(o.calls), convert_lines(o.puts)))
            .unwrap_or_default();

        Ok(OptionChain {
            ticker: ticker.to_uppercase(),
            expiry,
            calls,
            puts,
        })
    }

    /// Latest 13-week T-bill yield as a decimal rate.
    ///
    /// # Errors
    /// Returns error if the API call fails.
    pub async fn get_risk_free_rate(&self) -> Result<Option<f64>> {
        let history = self.chart(RISK_FREE_SYMBOL, RATE_LOOKBACK, "1d").await?;
        Ok(history.and_then(|h| h.last_close()).map(|pct| pct / 100.0))
    }
}

#[async_trait]
impl MarketDataSource for YahooClient {
    async fn spot_and_dividends(&self, ticker: &str) -> Result<SpotSnapshot> {
        self.get_spot_and_dividends(ticker).await
    }

    async fn expiries(&self, ticker: &str) -> Result<Vec<NaiveDate>> {
        self.get_expiries(ticker).await
    }

    async fn option_chain(&self, ticker: &str, expiry: NaiveDate) -> Result<OptionChain> {
        self.get_option_chain(ticker, expiry).await
    }

    async fn risk_free_rate(&self) -> Result<Option<f64>> {
        self.get_risk_free_rate().await
    }
}

fn convert_lines(raw: Option<Vec<RawOptionData>>) -> Vec<OptionLine> {
    raw.unwrap_or_default()
        .into_iter()
        .filter_map(|d| {
            let strike = d.strike.filter(|k| k.is_finite())?;
            Some(OptionLine {
                strike,
                quote: Quote::new(d.bid, d.ask, d.last_price),
                volume: d.volume.and_then(|v| u64::try_from(v).ok()),
                open_interest: d.open_interest.and_then(|v| u64::try_from(v).ok()),
            })
        })
        .collect()
}

// =============================================================================
// API Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawChartResponse {
    chart: RawChartResult,
}

#[derive(Debug, Deserialize)]
struct RawChartResult {
    result: Option<Vec<RawChart>>,
}

#[derive(Debug, Deserialize)]
struct RawChart {
    events: Option<RawEvents>,
    indicators: Option<RawIndicators>,
}

impl RawChart {
    /// Last non-null, finite close.
    fn last_close(&self) -> Option<f64> {
        self.indicators
            .as_ref()?
            .quote
            .first()?
            .close
            .as_ref()?
            .iter()
            .rev()
            .flatten()
            .copied()
            .find(|c| c.is_finite())
    }

    /// Dividends ordered by ex-date.
    fn dividends(&self) -> Vec<Dividend> {
        let mut divs: Vec<Dividend> = self
            .events
            .as_ref()
            .and_then(|e| e.dividends.as_ref())
            .map(|d| {
                d.values()
                    .filter_map(|raw| {
                        let ex_date = DateTime::from_timestamp(raw.date, 0)?.naive_utc();
                        Some(Dividend {
                            ex_date,
                            amount: raw.amount,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        divs.sort_by_key(|d| d.ex_date);
        divs
    }
}

#[derive(Debug, Deserialize)]
struct RawEvents {
    dividends: Option<HashMap<String, RawDividend>>,
}

#[derive(Debug, Deserialize)]
struct RawDividend {
    amount: f64,
    date: i64,
}

#[derive(Debug, Deserialize)]
struct RawIndicators {
    quote: Vec<RawQuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct RawQuoteSeries {
    close: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct RawOptionsResponse {
    #[serde(rename = "optionChain")]
    option_chain: RawOptionChain,
}

#[derive(Debug, Deserialize)]
struct RawOptionChain {
    result: Option<Vec<RawOptionChainData>>,
}

#[derive(Debug, Deserialize)]
struct RawOptionChainData {
    #[serde(rename = "expirationDates")]
    expiration_dates: Option<Vec<i64>>,
    options: Option<Vec<RawOptions>>,
}

#[derive(Debug, Deserialize)]
struct RawOptions {
    calls: Option<Vec<RawOptionData>>,
    puts: Option<Vec<RawOptionData>>,
}

#[derive(Debug, Deserialize)]
struct RawOptionData {
    strike: Option<f64>,
    bid: Option<f64>,
    ask: Option<f64>,
    #[serde(rename = "lastPrice")]
    last_price: Option<f64>,
    volume: Option<i64>,
    #[serde(rename = "openInterest")]
    open_interest: Option<i64>,
}
