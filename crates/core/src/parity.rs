//! Put–call parity math.
//!
//! Under parity `C - P = S - K e^{-r tau} - PV(div)`. The gap is the observed
//! left side minus the theoretical right side; positive means calls are rich
//! relative to puts.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::context::MarketContext;
use crate::error::ParityError;
use crate::quote::Quote;

/// Trade direction for the executable gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Calls rich: sell call at bid, buy put at ask, stock leg at its ask.
    #[serde(alias = "A", alias = "a", alias = "calls-rich", alias = "buy-call-sell-put-sell-stock")]
    CallsRich,
    /// Puts rich: stock leg at its bid, buy call at ask, sell put at bid.
    #[serde(alias = "B", alias = "b", alias = "puts-rich", alias = "sell-call-buy-put-buy-stock")]
    PutsRich,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CallsRich => write!(f, "A"),
            Self::PutsRich => write!(f, "B"),
        }
    }
}

impl FromStr for Direction {
    type Err = ParityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "calls_rich" | "calls-rich" | "buy-call-sell-put-sell-stock" => {
                Ok(Self::CallsRich)
            }
            "b" | "puts_rich" | "puts-rich" | "sell-call-buy-put-buy-stock" => Ok(Self::PutsRich),
            other => Err(ParityError::Configuration(format!(
                "unknown direction '{other}', expected A or B"
            ))),
        }
    }
}

/// One strike's quotes plus the shared market context.
#[derive(Debug, Clone, Copy)]
pub struct ParityInputs<'a> {
    pub strike: f64,
    pub call: Quote,
    pub put: Quote,
    pub context: &'a MarketContext,
}

impl<'a> ParityInputs<'a> {
    #[must_use]
    pub fn new(strike: f64, call: Quote, put: Quote, context: &'a MarketContext) -> Self {
        Self {
            strike,
            call,
            put,
            context,
        }
    }

    /// Theoretical `C - P` for this strike.
    #[must_use]
    pub fn rhs(&self) -> f64 {
        let ctx = self.context;
        theoretical_rhs(
            ctx.spot,
            self.strike,
            ctx.tau_years,
            ctx.risk_free_annual,
            ctx.pv_dividends,
        )
    }

    /// Discounted strike `K e^{-r tau}`.
    #[must_use]
    pub fn discounted_strike(&self) -> f64 {
        self.strike * self.context.discount_factor()
    }
}

/// Right-hand side of put–call parity: `S - K e^{-r tau} - pv_div`.
///
/// Non-finite inputs yield a non-finite result.
#[must_use]
pub fn theoretical_rhs(spot: f64, strike: f64, tau: f64, rate: f64, pv_div: f64) -> f64 {
    spot - strike * (-rate * tau).exp() - pv_div
}

/// Parity gap at mid prices. Unknown if either side has no mid.
#[must_use]
pub fn gap_mid(inputs: &ParityInputs<'_>) -> Option<f64> {
    let call_mid = inputs.call.mid_price()?;
    let put_mid = inputs.put.mid_price()?;
    Some(gap_from_mids(call_mid, put_mid, inputs.rhs()))
}

/// `(C_mid - P_mid) - rhs`.
#[must_use]
pub fn gap_from_mids(call_mid: f64, put_mid: f64, rhs: f64) -> f64 {
    (call_mid - put_mid) - rhs
}

/// Direction implied by a mid gap; `None` when flat or unknown.
#[must_use]
pub fn infer_direction(gap_mid: Option<f64>) -> Option<Direction> {
    match gap_mid {
        Some(g) if g > 0.0 => Some(Direction::CallsRich),
        Some(g) if g < 0.0 => Some(Direction::PutsRich),
        _ => None,
    }
}

/// Parity gap after crossing the option and stock spreads.
///
/// Uses `hint` when given, otherwise the sign of the mid gap. With no
/// direction to trade the result is exactly `0.0`. Missing bids/asks count
/// as zero in the legs.
#[must_use]
pub fn gap_exec(inputs: &ParityInputs<'_>, hint: Option<Direction>) -> f64 {
    let direction = match hint {
        Some(d) => d,
        None => match infer_direction(gap_mid(inputs)) {
            Some(d) => d,
            None => return 0.0,
        },
    };

    let ctx = inputs.context;
    let forward = inputs.discounted_strike() + ctx.pv_dividends;

    match direction {
        Direction::CallsRich => {
            let lhs_exec = inputs.call.bid_or_zero() - inputs.put.ask_or_zero();
            let rhs_exec = ctx.stock_ask() - forward;
            lhs_exec - rhs_exec
        }
        Direction::PutsRich => {
            let lhs_exec = ctx.stock_bid() - forward;
            let rhs_exec = inputs.call.ask_or_zero() - inputs.put.bid_or_zero();
            lhs_exec - rhs_exec
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-4;

    fn ctx() -> MarketContext {
        MarketContext::new(100.0, 0.25, 0.05, 0.0, 1.0).unwrap()
    }

    #[test]
    fn test_rhs_zero_tau_or_rate_collapses_to_intrinsic() {
        assert_eq!(theoretical_rhs(105.0, 100.0, 0.0, 0.05, 0.0), 5.0);
        assert_eq!(theoretical_rhs(105.0, 100.0, 0.75, 0.0, 0.0), 5.0);
        assert_eq!(theoretical_rhs(105.0, 100.0, 0.0, 0.05, 1.5), 3.5);
    }

    #[test]
    fn test_rhs_propagates_non_finite() {
        assert!(theoretical_rhs(100.0, 100.0, f64::NAN, 0.05, 0.0).is_nan());
        assert!(!theoretical_rhs(100.0, 100.0, 1.0, f64::NEG_INFINITY, 0.0).is_finite());
    }

    #[test]
    fn test_gap_mid_scenario() {
        let ctx = ctx();
        let inputs = ParityInputs::new(
            100.0,
            Quote::new(None, None, Some(5.0)),
            Quote::new(None, None, Some(3.0)),
            &ctx,
        );
        assert!((inputs.rhs() - 1.2422).abs() < EPS);
        let gap = gap_mid(&inputs).unwrap();
        assert!((gap - 0.7578).abs() < EPS);
    }

    #[test]
    fn test_gap_mid_unknown_when_side_missing() {
        let ctx = ctx();
        let inputs = ParityInputs::new(100.0, Quote::new(None, None, Some(5.0)), Quote::empty(), &ctx);
        assert_eq!(gap_mid(&inputs), None);
    }

    #[test]
    fn test_gap_mid_is_linear_in_call_minus_put() {
        let rhs = 1.25;
        let base = gap_from_mids(5.0, 3.0, rhs);
        let shifted = gap_from_mids(5.5, 3.0, rhs);
        let widened = gap_from_mids(6.0, 2.0, rhs);
        assert!((shifted - base - 0.5).abs() < 1e-12);
        assert!((widened - base - 2.0).abs() < 1e-12);
        // swapping sides negates only when rhs is zero
        assert_eq!(gap_from_mids(5.0, 3.0, 0.0), -gap_from_mids(3.0, 5.0, 0.0));
    }

    #[test]
    fn test_gap_exec_calls_rich_scenario() {
        let ctx = ctx();
        let inputs = ParityInputs::new(
            100.0,
            Quote::new(Some(4.9), Some(5.1), None),
            Quote::new(Some(2.9), Some(3.1), None),
            &ctx,
        );
        assert!(gap_mid(&inputs).unwrap() > 0.0);
        let gap = gap_exec(&inputs, None);
        assert!((gap - 0.5528).abs() < EPS);
        assert_eq!(gap_exec(&inputs, Some(Direction::CallsRich)), gap);
    }

    #[test]
    fn test_gap_exec_puts_rich() {
        let ctx = ctx();
        let inputs = ParityInputs::new(
            100.0,
            Quote::new(Some(0.9), Some(1.1), None),
            Quote::new(Some(2.9), Some(3.1), None),
            &ctx,
        );
        assert!(gap_mid(&inputs).unwrap() < 0.0);
        let expected = (99.995 - 100.0 * (-0.0125f64).exp()) - (1.1 - 2.9);
        assert!((gap_exec(&inputs, None) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_gap_exec_hint_overrides_inferred_direction() {
        let ctx = ctx();
        let inputs = ParityInputs::new(
            100.0,
            Quote::new(Some(4.9), Some(5.1), None),
            Quote::new(Some(2.9), Some(3.1), None),
            &ctx,
        );
        let forced = gap_exec(&inputs, Some(Direction::PutsRich));
        let expected = (99.995 - 100.0 * (-0.0125f64).exp()) - (5.1 - 2.9);
        assert!((forced - expected).abs() < 1e-9);
    }

    #[test]
    fn test_gap_exec_zero_without_direction() {
        let ctx = MarketContext::new(100.0, 0.0, 0.05, 0.0, 1.0).unwrap();
        // C - P equals S - K exactly, so the mid gap is zero
        let inputs = ParityInputs::new(
            100.0,
            Quote::new(Some(2.0), Some(4.0), None),
            Quote::new(Some(2.0), Some(4.0), None),
            &ctx,
        );
        assert_eq!(gap_mid(&inputs), Some(0.0));
        assert_eq!(gap_exec(&inputs, None), 0.0);

        let empty = ParityInputs::new(100.0, Quote::empty(), Quote::empty(), &ctx);
        assert_eq!(gap_exec(&empty, None), 0.0);
    }

    #[test]
    fn test_gap_exec_missing_legs_count_as_zero() {
        let ctx = ctx();
        // only last prices: direction is inferred but every leg is zero
        let inputs = ParityInputs::new(
            100.0,
            Quote::new(None, None, Some(5.0)),
            Quote::new(None, None, Some(3.0)),
            &ctx,
        );
        let expected = 0.0 - (100.005 - 100.0 * (-0.0125f64).exp());
        assert!((gap_exec(&inputs, None) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!("A".parse::<Direction>().unwrap(), Direction::CallsRich);
        assert_eq!("puts-rich".parse::<Direction>().unwrap(), Direction::PutsRich);
        assert_eq!(
            "sell-call-buy-put-buy-stock".parse::<Direction>().unwrap(),
            Direction::PutsRich
        );
        assert!("sideways".parse::<Direction>().is_err());
        assert_eq!(Direction::CallsRich.to_string(), "A");
    }

    #[test]
    fn test_direction_deserialize_accepts_cli_spellings() {
        let parse = |s: &str| serde_json::from_str::<Direction>(&format!("\"{s}\""));
        assert_eq!(parse("A").unwrap(), Direction::CallsRich);
        assert_eq!(parse("calls_rich").unwrap(), Direction::CallsRich);
        assert_eq!(parse("buy-call-sell-put-sell-stock").unwrap(), Direction::CallsRich);
        assert_eq!(parse("B").unwrap(), Direction::PutsRich);
        assert_eq!(parse("puts-rich").unwrap(), Direction::PutsRich);
        assert_eq!(parse("sell-call-buy-put-buy-stock").unwrap(), Direction::PutsRich);
        assert!(parse("sideways").is_err());
    }
}
