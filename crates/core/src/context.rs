//! Market context shared by every strike of one expiry.

use serde::{Deserialize, Serialize};

use crate::error::{ParityError, Result};

/// Default assumed full bid/ask width of the underlying, in cents.
pub const DEFAULT_STOCK_SPREAD_CENTS: f64 = 1.0;

/// Immutable market parameters for one expiry.
///
/// Built once per expiry and shared by reference across all rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ContextFields")]
pub struct MarketContext {
    /// Spot price of the underlying.
    pub spot: f64,
    /// Time to expiry in years.
    pub tau_years: f64,
    /// Annualized risk-free rate (continuous compounding).
    pub risk_free_annual: f64,
    /// Present value of dividends paid before expiry.
    pub pv_dividends: f64,
    /// Full stock bid/ask width in cents.
    pub stock_spread_cents: f64,
}

#[derive(Deserialize)]
struct ContextFields {
    spot: f64,
    tau_years: f64,
    risk_free_annual: f64,
    #[serde(default)]
    pv_dividends: f64,
    #[serde(default = "default_stock_spread_cents")]
    stock_spread_cents: f64,
}

fn default_stock_spread_cents() -> f64 {
    DEFAULT_STOCK_SPREAD_CENTS
}

impl TryFrom<ContextFields> for MarketContext {
    type Error = ParityError;

    fn try_from(raw: ContextFields) -> Result<Self> {
        Self::new(
            raw.spot,
            raw.tau_years,
            raw.risk_free_annual,
            raw.pv_dividends,
            raw.stock_spread_cents,
        )
    }
}

impl MarketContext {
    /// Creates a validated market context.
    ///
    /// # Errors
    /// Returns `ParityError::InvalidContext` if spot is not positive, tau or
    /// the dividend PV is negative, the rate is not finite, or the stock
    /// spread is not positive.
    pub fn new(
        spot: f64,
        tau_years: f64,
        risk_free_annual: f64,
        pv_dividends: f64,
        stock_spread_cents: f64,
    ) -> Result<Self> {
        if !(spot.is_finite() && spot > 0.0) {
            return Err(ParityError::invalid_context("spot", spot, "must be finite and > 0"));
        }
        if !(tau_years.is_finite() && tau_years >= 0.0) {
            return Err(ParityError::invalid_context(
                "tau_years",
                tau_years,
                "must be finite and >= 0",
            ));
        }
        if !risk_free_annual.is_finite() {
            return Err(ParityError::invalid_context(
                "risk_free_annual",
                risk_free_annual,
                "must be finite",
            ));
        }
        if !(pv_dividends.is_finite() && pv_dividends >= 0.0) {
            return Err(ParityError::invalid_context(
                "pv_dividends",
                pv_dividends,
                "must be finite and >= 0",
            ));
        }
        if !(stock_spread_cents.is_finite() && stock_spread_cents > 0.0) {
            return Err(ParityError::invalid_context(
                "stock_spread_cents",
                stock_spread_cents,
                "must be finite and > 0",
            ));
        }

        Ok(Self {
            spot,
            tau_years,
            risk_free_annual,
            pv_dividends,
            stock_spread_cents,
        })
    }

    /// Continuous discount factor `exp(-r * tau)`.
    #[must_use]
    pub fn discount_factor(&self) -> f64 {
        (-self.risk_free_annual * self.tau_years).exp()
    }

    /// Half of the stock spread in dollars.
    #[must_use]
    pub fn stock_half_spread(&self) -> f64 {
        self.stock_spread_cents / 200.0
    }

    /// Assumed stock bid.
    #[must_use]
    pub fn stock_bid(&self) -> f64 {
        self.spot - self.stock_half_spread()
    }

    /// Assumed stock ask.
    #[must_use]
    pub fn stock_ask(&self) -> f64 {
        self.spot + self.stock_half_spread()
    }
}
