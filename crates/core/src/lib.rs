//! Put–call parity core.
//!
//! Pure numeric logic that turns one option-chain row plus an expiry's
//! market context into a mid-price parity gap and an executable gap, along
//! with the calendar, dividend and summary helpers the pipeline needs.
//! Nothing in this crate performs I/O besides loading configuration.

pub mod config;
pub mod config_loader;
pub mod context;
pub mod dividends;
pub mod error;
pub mod evaluator;
pub mod expiry;
pub mod parity;
pub mod quote;
pub mod record;
pub mod summary;
pub mod summary_formatter;

pub use config::{AnalysisConfig, AppConfig, OutputConfig, YahooConfig};
pub use config_loader::ConfigLoader;
pub use context::{MarketContext, DEFAULT_STOCK_SPREAD_CENTS};
pub use dividends::{pv_of_dividends, Dividend};
pub use error::{ParityError, Result};
pub use evaluator::{ChainRow, ParityEvaluator, ParityGaps};
pub use expiry::{
    days_to_expiry, now_utc_naive, select_expiries, time_to_expiry_years, DteWindow,
};
pub use parity::{gap_exec, gap_mid, theoretical_rhs, Direction, ParityInputs};
pub use quote::{mid_price, Quote};
pub use record::ParityRecord;
pub use summary::{summarize, ExpirySummary};
pub use summary_formatter::SummaryFormatter;
