//! Market data and storage for the put-call parity checker.
//!
//! This crate provides:
//! - The `MarketDataSource` trait the pipeline consumes
//! - A rate-limited Yahoo Finance client implementing it
//! - CSV export of parity results and summaries, and CSV import of chains

pub mod csv_storage;
pub mod error;
pub mod source;
pub mod yahoo;

pub use csv_storage::CsvStorage;
pub use error::{DataError, Result};
pub use source::{MarketDataSource, OptionChain, OptionLine, SpotSnapshot};
pub use yahoo::{YahooClient, RISK_FREE_SYMBOL, YAHOO_API_URL};
