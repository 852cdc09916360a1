//! PriceHistory: timestamped multi-instrument ticks.
//!
//! Candles may be added in any order. The chronological index is rebuilt
//! lazily on the first read after a write.

use crate::components::{IndicatorError, IndicatorSet};
use crate::domain::{Candle, Tick};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HistoryError {
    #[error("duplicate candle for {instrument} at {time}")]
    DuplicateCandle {
        instrument: String,
        time: DateTime<Utc>,
    },
    #[error("instrument must not be empty")]
    EmptyInstrument,
}

#[derive(Debug, Clone, Default)]
pub struct PriceHistory {
    rows: Vec<(DateTime<Utc>, Tick)>,
    index: HashMap<DateTime<Utc>, usize>,
    /// Row indices in increasing time order. Valid only when `!dirty`.
    sorted: Vec<usize>,
    dirty: bool,
}

impl PriceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one candle, keyed by its own timestamp.
    pub fn add_candle(
        &mut self,
        instrument: impl Into<String>,
        candle: Candle,
    ) -> Result<(), HistoryError> {
        let instrument = instrument.into();
        if instrument.trim().is_empty() {
            return Err(HistoryError::EmptyInstrument);
        }
        let time = candle.time;

        match self.index.get(&time) {
            Some(&row) => {
                let tick = &mut self.rows[row].1;
                if tick.contains_key(&instrument) {
                    return Err(HistoryError::DuplicateCandle { instrument, time });
                }
                tick.insert(instrument, candle);
            }
            None => {
                let mut tick = Tick::new();
                tick.insert(instrument, candle);
                self.index.insert(time, self.rows.len());
                self.rows.push((time, tick));
                self.dirty = true;
            }
        }
        Ok(())
    }

    /// Add a series of candles for one instrument.
    pub fn add_series(
        &mut self,
        instrument: &str,
        candles: impl IntoIterator<Item = Candle>,
    ) -> Result<(), HistoryError> {
        for candle in candles {
            self.add_candle(instrument, candle)?;
        }
        Ok(())
    }

    /// Ticks in increasing time order.
    pub fn ticks(&mut self) -> Ticks<'_> {
        self.ensure_sorted();
        Ticks {
            rows: &self.rows,
            order: self.sorted.iter(),
        }
    }

    pub fn tick_at(&self, time: DateTime<Utc>) -> Option<&Tick> {
        self.index.get(&time).map(|&row| &self.rows[row].1)
    }

    /// Number of distinct timestamps.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn instruments(&self) -> BTreeSet<String> {
        self.rows
            .iter()
            .flat_map(|(_, tick)| tick.keys().cloned())
            .collect()
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.index.keys().min().copied()
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.index.keys().max().copied()
    }

    /// One instrument's candles in time order.
    pub fn series(&mut self, instrument: &str) -> Vec<Candle> {
        self.ticks()
            .filter_map(|(_, tick)| tick.get(instrument).cloned())
            .collect()
    }

    /// Compute every indicator per instrument and attach the values to the
    /// stored candles. Instruments are computed in parallel; the write-back
    /// is serial.
    pub fn apply_indicators(&mut self, indicators: &IndicatorSet) -> Result<(), IndicatorError> {
        if indicators.is_empty() || self.rows.is_empty() {
            return Ok(());
        }
        self.ensure_sorted();

        // instrument -> (row, candle) in time order
        let mut by_instrument: HashMap<String, (Vec<usize>, Vec<Candle>)> = HashMap::new();
        for &row in &self.sorted {
            for (instrument, candle) in &self.rows[row].1 {
                let entry = by_instrument.entry(instrument.clone()).or_default();
                entry.0.push(row);
                entry.1.push(candle.clone());
            }
        }

        let computed = by_instrument
            .into_par_iter()
            .map(|(instrument, (rows, mut candles))| -> Result<_, IndicatorError> {
                indicators.apply(&mut candles)?;
                Ok((instrument, rows, candles))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (instrument, rows, candles) in computed {
            for (row, candle) in rows.into_iter().zip(candles) {
                self.rows[row].1.insert(instrument.clone(), candle);
            }
        }

        debug!(
            indicators = indicators.len(),
            ticks = self.rows.len(),
            "indicators applied"
        );
        Ok(())
    }

    fn ensure_sorted(&mut self) {
        if !self.dirty && self.sorted.len() == self.rows.len() {
            return;
        }
        let rows = &self.rows;
        let mut sorted: Vec<usize> = (0..rows.len()).collect();
        sorted.sort_by_key(|&row| rows[row].0);
        self.sorted = sorted;
        self.dirty = false;
    }
}

/// Chronological iterator over `(time, tick)`.
pub struct Ticks<'a> {
    rows: &'a [(DateTime<Utc>, Tick)],
    order: std::slice::Iter<'a, usize>,
}

impl<'a> Iterator for Ticks<'a> {
    type Item = (DateTime<Utc>, &'a Tick);

    fn next(&mut self) -> Option<Self::Item> {
        self.order.next().map(|&row| {
            let (time, tick) = &self.rows[row];
            (*time, tick)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl ExactSizeIterator for Ticks<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::CustomIndicator;
    use crate::indicators::{make_candles, Sma};
    use std::sync::Arc;

    #[test]
    fn ticks_are_yielded_in_time_order() {
        let candles = make_candles(&[1.0, 2.0, 3.0]);
        let mut history = PriceHistory::new();
        for candle in candles.iter().rev() {
            history.add_candle("AAPL", candle.clone()).unwrap();
        }

        let times: Vec<_> = history.ticks().map(|(t, _)| t).collect();
        assert_eq!(times, candles.iter().map(|c| c.time).collect::<Vec<_>>());
        assert_eq!(history.series("AAPL")[0].close, 1.0);
    }

    #[test]
    fn instruments_share_ticks_by_timestamp() {
        let mut history = PriceHistory::new();
        history.add_series("AAPL", make_candles(&[1.0, 2.0])).unwrap();
        history.add_series("MSFT", make_candles(&[10.0, 20.0])).unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history.instruments().len(), 2);
        let (_, first) = history.ticks().next().unwrap();
        assert_eq!(first["AAPL"].close, 1.0);
        assert_eq!(first["MSFT"].close, 10.0);
    }

    #[test]
    fn duplicate_candle_is_rejected() {
        let candle = make_candles(&[1.0]).remove(0);
        let mut history = PriceHistory::new();
        history.add_candle("AAPL", candle.clone()).unwrap();
        let err = history.add_candle("AAPL", candle.clone()).unwrap_err();
        assert!(matches!(err, HistoryError::DuplicateCandle { .. }));
        // Same instant, other instrument is fine.
        history.add_candle("MSFT", candle).unwrap();
    }

    #[test]
    fn adding_after_iteration_resorts() {
        let candles = make_candles(&[1.0, 2.0, 3.0]);
        let mut history = PriceHistory::new();
        history.add_candle("AAPL", candles[2].clone()).unwrap();
        assert_eq!(history.ticks().count(), 1);

        history.add_candle("AAPL", candles[0].clone()).unwrap();
        history.add_candle("AAPL", candles[1].clone()).unwrap();
        let closes: Vec<f64> = history.ticks().map(|(_, t)| t["AAPL"].close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
        assert_eq!(history.start_time(), Some(candles[0].time));
        assert_eq!(history.end_time(), Some(candles[2].time));
    }

    #[test]
    fn indicators_attach_per_instrument() {
        let mut history = PriceHistory::new();
        history.add_series("AAPL", make_candles(&[10.0, 11.0, 12.0])).unwrap();
        history.add_series("MSFT", make_candles(&[100.0, 110.0, 120.0])).unwrap();

        let set = IndicatorSet::new(vec![Arc::new(Sma::new(2))]).unwrap();
        history.apply_indicators(&set).unwrap();

        let aapl = history.series("AAPL");
        assert!(!aapl[0].has_indicator("sma_2"));
        assert_eq!(aapl[1].indicator("sma_2"), Some(10.5));
        let msft = history.series("MSFT");
        assert_eq!(msft[2].indicator("sma_2"), Some(115.0));
    }

    #[test]
    fn indicator_failure_leaves_history_untouched() {
        let mut history = PriceHistory::new();
        history.add_series("AAPL", make_candles(&[10.0, 11.0])).unwrap();
        let broken = CustomIndicator::new("broken", |_: &[Candle]| Vec::new());
        let set = IndicatorSet::new(vec![Arc::new(broken)]).unwrap();

        assert!(history.apply_indicators(&set).is_err());
        assert!(history.series("AAPL").iter().all(|c| c.indicators().is_empty()));
    }
}
