//! Row evaluator: one chain row plus market context in, two gaps out.

use serde::{Deserialize, Serialize};

use crate::context::MarketContext;
use crate::error::{ParityError, Result};
use crate::parity::{gap_exec, gap_mid, Direction, ParityInputs};
use crate::quote::Quote;

/// One strike of an option chain with both sides joined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainRow {
    pub strike: Option<f64>,
    pub call: Quote,
    pub put: Quote,
    pub call_volume: Option<u64>,
    pub call_open_interest: Option<u64>,
    pub put_volume: Option<u64>,
    pub put_open_interest: Option<u64>,
}

impl ChainRow {
    /// Row with a strike and quotes, no volume data.
    #[must_use]
    pub fn new(strike: f64, call: Quote, put: Quote) -> Self {
        Self {
            strike: Some(strike),
            call,
            put,
            ..Self::default()
        }
    }

    /// Validated strike.
    ///
    /// # Errors
    /// Returns `ParityError::InvalidStrike` when the strike is missing,
    /// non-finite, or not strictly positive.
    pub fn validated_strike(&self) -> Result<f64> {
        match self.strike {
            None => Err(ParityError::InvalidStrike("missing".to_string())),
            Some(k) if k.is_finite() && k > 0.0 => Ok(k),
            Some(k) => Err(ParityError::InvalidStrike(format!("{k} must be finite and > 0"))),
        }
    }
}

/// Output of one row evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParityGaps {
    /// Mid-price gap; `None` when either side has no usable price.
    pub gap_mid: Option<f64>,
    /// Executable gap; `0.0` when there is no direction to trade.
    pub gap_exec: f64,
}

/// Evaluates chain rows against one expiry's market context.
///
/// Holds nothing but the immutable context, so a single evaluator can be
/// shared across threads.
#[derive(Debug, Clone, Copy)]
pub struct ParityEvaluator {
    context: MarketContext,
}

impl ParityEvaluator {
    #[must_use]
    pub fn new(context: MarketContext) -> Self {
        Self { context }
    }

    #[must_use]
    pub fn context(&self) -> &MarketContext {
        &self.context
    }

    /// Computes both gaps for one row.
    ///
    /// # Errors
    /// Returns `ParityError::InvalidStrike` if the row has no usable strike.
    pub fn evaluate(&self, row: &ChainRow, hint: Option<Direction>) -> Result<ParityGaps> {
        let strike = row.validated_strike()?;
        let inputs = ParityInputs::new(strike, row.call, row.put, &self.context);

        Ok(ParityGaps {
            gap_mid: gap_mid(&inputs),
            gap_exec: gap_exec(&inputs, hint),
        })
    }

    /// Evaluates every row, stopping at the first structural failure.
    ///
    /// # Errors
    /// Returns the first `ParityError` raised by a row.
    pub fn evaluate_chain(
        &self,
        rows: &[ChainRow],
        hint: Option<Direction>,
    ) -> Result<Vec<ParityGaps>> {
        rows.iter().map(|row| self.evaluate(row, hint)).collect()
    }
}
