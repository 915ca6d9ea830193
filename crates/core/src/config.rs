use serde::{Deserialize, Serialize};

use crate::context::DEFAULT_STOCK_SPREAD_CENTS;
use crate::error::{ParityError, Result};
use crate::expiry::{DteWindow, DEFAULT_MAX_EXPIRIES};
use crate::parity::Direction;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub yahoo: YahooConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub min_dte: i64,
    pub max_dte: i64,
    pub max_expiries: usize,
    /// Subtract PV of dividends through expiry from the parity relationship.
    pub use_dividends: bool,
    /// Full stock bid/ask width in cents.
    pub stock_spread_cents: f64,
    /// Fixed annual risk-free rate; skips the rate lookup when set.
    pub rf_override: Option<f64>,
    /// Rate used when the rate source has no history.
    pub rf_fallback: f64,
    pub direction_hint: Option<Direction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YahooConfig {
    pub base_url: String,
    pub requests_per_minute: u32,
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_dte: 7,
            max_dte: 120,
            max_expiries: DEFAULT_MAX_EXPIRIES,
            use_dividends: false,
            stock_spread_cents: DEFAULT_STOCK_SPREAD_CENTS,
            rf_override: None,
            rf_fallback: 0.03,
            direction_hint: None,
        }
    }
}

impl AnalysisConfig {
    /// Checks the values the pipeline relies on.
    ///
    /// # Errors
    /// Returns `ParityError::Configuration` for an inverted DTE window, a
    /// non-positive stock spread, or a non-finite rate.
    pub fn validate(&self) -> Result<()> {
        if self.min_dte > self.max_dte {
            return Err(ParityError::Configuration(format!(
                "min_dte ({}) is greater than max_dte ({})",
                self.min_dte, self.max_dte
            )));
        }
        if !(self.stock_spread_cents.is_finite() && self.stock_spread_cents > 0.0) {
            return Err(ParityError::Configuration(format!(
                "stock_spread_cents must be > 0, got {}",
                self.stock_spread_cents
            )));
        }
        if let Some(rf) = self.rf_override {
            if !rf.is_finite() {
                return Err(ParityError::Configuration(format!(
                    "rf_override must be finite, got {rf}"
                )));
            }
        }
        if !self.rf_fallback.is_finite() {
            return Err(ParityError::Configuration(format!(
                "rf_fallback must be finite, got {}",
                self.rf_fallback
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn dte_window(&self) -> DteWindow {
        DteWindow {
            min_dte: self.min_dte,
            max_dte: self.max_dte,
            max_expiries: self.max_expiries,
        }
    }
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            requests_per_minute: 60,
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "outputs".to_string(),
        }
    }
}
