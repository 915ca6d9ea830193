use std::fs::File;
use std::path::Path;
use std::str::FromStr;

use csv::{Reader, Writer};
use parity_core::{ChainRow, ExpirySummary, ParityRecord, Quote};
use serde::{Deserialize, Deserializer};

use crate::error::Result;

pub struct CsvStorage;

/// Input row of an offline chain file.
///
/// Only `strike` is expected; every other column may be absent or empty.
/// Tokens that do not parse as numbers (`N/A`, `-`) read as unknown.
#[derive(Debug, Deserialize)]
struct ChainCsvRow {
    #[serde(default, deserialize_with = "lenient")]
    strike: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    call_bid: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    call_ask: Option<f64>,
    #[serde(default, alias = "call_lastPrice", deserialize_with = "lenient")]
    call_last: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    call_volume: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    call_open_interest: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    put_bid: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    put_ask: Option<f64>,
    #[serde(default, alias = "put_lastPrice", deserialize_with = "lenient")]
    put_last: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    put_volume: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    put_open_interest: Option<u64>,
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.trim().parse().ok()))
}

impl From<ChainCsvRow> for ChainRow {
    fn from(raw: ChainCsvRow) -> Self {
        Self {
            strike: raw.strike,
            call: Quote::new(raw.call_bid, raw.call_ask, raw.call_last),
            put: Quote::new(raw.put_bid, raw.put_ask, raw.put_last),
            call_volume: raw.call_volume,
            call_open_interest: raw.call_open_interest,
            put_volume: raw.put_volume,
            put_open_interest: raw.put_open_interest,
        }
    }
}

impl CsvStorage {
    /// Writes parity records with a header row. Unknown values are empty
    /// fields.
    ///
    /// # Errors
    /// Returns error if the file cannot be created or writing fails.
    pub fn write_records(path: impl AsRef<Path>, records: &[ParityRecord]) -> Result<()> {
        Self::write_all(path.as_ref(), records)
    }

    /// Writes per-expiry summaries with a header row.
    ///
    /// # Errors
    /// Returns error if the file cannot be created or writing fails.
    pub fn write_summary(path: impl AsRef<Path>, summaries: &[ExpirySummary]) -> Result<()> {
        Self::write_all(path.as_ref(), summaries)
    }

    /// Reads an option chain file.
    ///
    /// Format: `strike,call_bid,call_ask,call_last,put_bid,put_ask,put_last`
    /// plus optional volume and open interest columns.
    ///
    /// # Errors
    /// Returns error if the file cannot be opened or a row cannot be parsed.
    pub fn read_chain(path: impl AsRef<Path>) -> Result<Vec<ChainRow>> {
        let mut reader = Reader::from_path(path.as_ref())?;
        let mut rows = Vec::new();
        for result in reader.deserialize::<ChainCsvRow>() {
            rows.push(result?.into());
        }
        Ok(rows)
    }

    fn write_all<T: serde::Serialize>(path: &Path, items: &[T]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(path)?;
        let mut writer = Writer::from_writer(file);
        for item in items {
            writer.serialize(item)?;
        }
        writer.flush()?;

        tracing::debug!(path = %path.display(), rows = items.len(), "Wrote CSV");
        Ok(())
    }
}
