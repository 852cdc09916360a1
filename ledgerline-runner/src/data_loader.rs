//! CSV price loading.
//!
//! One row per candle, with a header:
//!
//! ```text
//! time,instrument,open,high,low,close,volume
//! 2024-01-02T16:00:00Z,AAPL,185.0,186.5,184.2,185.6,52000
//! ```
//!
//! Times are RFC 3339. Rows may appear in any order and instruments may be
//! interleaved; [`PriceHistory`] groups them by timestamp.

use chrono::{DateTime, Utc};
use ledgerline_core::data::HistoryError;
use ledgerline_core::{Candle, PriceHistory};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("line {line}: {source}")]
    Row {
        line: usize,
        #[source]
        source: csv::Error,
    },
    #[error("line {line}: {instrument} candle at {time} fails the OHLC sanity check")]
    InvalidCandle {
        line: usize,
        instrument: String,
        time: DateTime<Utc>,
    },
    #[error("line {line}: {source}")]
    History {
        line: usize,
        #[source]
        source: HistoryError,
    },
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    time: DateTime<Utc>,
    instrument: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

/// Load a CSV price file into a [`PriceHistory`].
pub fn load_csv(path: &Path) -> Result<PriceHistory, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| LoadError::Open {
        path: path.to_path_buf(),
        source: csv::Error::from(e),
    })?;
    let history = load_csv_reader(file)?;
    debug!(
        path = %path.display(),
        ticks = history.len(),
        "price history loaded"
    );
    Ok(history)
}

/// Load CSV price rows from any reader.
pub fn load_csv_reader<R: Read>(reader: R) -> Result<PriceHistory, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut history = PriceHistory::new();
    for (i, result) in reader.deserialize::<CsvRow>().enumerate() {
        // Line 1 is the header.
        let line = i + 2;
        let row = result.map_err(|source| LoadError::Row { line, source })?;

        let candle = Candle::new(row.time, row.open, row.high, row.low, row.close, row.volume);
        if !candle.is_sane() {
            return Err(LoadError::InvalidCandle {
                line,
                instrument: row.instrument,
                time: row.time,
            });
        }
        history
            .add_candle(row.instrument, candle)
            .map_err(|source| LoadError::History { line, source })?;
    }
    Ok(history)
}
