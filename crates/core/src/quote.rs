//! Option quotes and mid-price resolution.

use serde::{Deserialize, Serialize};

/// Keeps a price only if it is finite and non-negative.
///
/// Anything else (NaN, infinities, negative prints) carries no information
/// and becomes `None`.
#[must_use]
pub fn sanitize_price(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

/// Bid/ask/last for one side (call or put) of a strike.
///
/// Deserialized quotes go through [`Quote::new`], so unusable prices arrive
/// as `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "QuoteFields")]
pub struct Quote {
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub last: Option<f64>,
}

#[derive(Deserialize)]
struct QuoteFields {
    #[serde(default)]
    bid: Option<f64>,
    #[serde(default)]
    ask: Option<f64>,
    #[serde(default)]
    last: Option<f64>,
}

impl From<QuoteFields> for Quote {
    fn from(raw: QuoteFields) -> Self {
        Self::new(raw.bid, raw.ask, raw.last)
    }
}

impl Quote {
    /// Creates a quote, dropping any field that is not a usable price.
    #[must_use]
    pub fn new(bid: Option<f64>, ask: Option<f64>, last: Option<f64>) -> Self {
        Self {
            bid: sanitize_price(bid),
            ask: sanitize_price(ask),
            last: sanitize_price(last),
        }
    }

    /// A quote with no information at all.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Representative price for this side.
    ///
    /// Mean of bid and ask when both are strictly positive, otherwise the
    /// last trade when strictly positive, otherwise unknown.
    #[must_use]
    pub fn mid_price(&self) -> Option<f64> {
        mid_price(self.bid, self.ask, self.last)
    }

    /// Bid as used by the executable legs: missing or unusable counts as
    /// zero.
    #[must_use]
    pub fn bid_or_zero(&self) -> f64 {
        sanitize_price(self.bid).unwrap_or(0.0)
    }

    /// Ask as used by the executable legs: missing or unusable counts as
    /// zero.
    #[must_use]
    pub fn ask_or_zero(&self) -> f64 {
        sanitize_price(self.ask).unwrap_or(0.0)
    }
}

/// Mid price from raw bid/ask/last fields.
#[must_use]
pub fn mid_price(bid: Option<f64>, ask: Option<f64>, last: Option<f64>) -> Option<f64> {
    let usable = |v: Option<f64>| v.filter(|x| x.is_finite() && *x > 0.0);

    match (usable(bid), usable(ask)) {
        (Some(b), Some(a)) => Some(0.5 * (b + a)),
        _ => usable(last),
    }
}
