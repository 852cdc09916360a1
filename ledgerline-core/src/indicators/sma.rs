//! Simple Moving Average (SMA).
//!
//! Rolling mean over a window of `period` values. A window containing a
//! missing value has no output.

use super::source_values;
use crate::components::Indicator;
use crate::domain::Candle;
use std::sync::Arc;

#[derive(Clone)]
pub struct Sma {
    period: usize,
    name: String,
    source: Vec<Arc<dyn Indicator>>,
}

impl Sma {
    /// SMA of close prices, named `sma_{period}`.
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
            source: Vec::new(),
        }
    }

    /// SMA of another indicator's values, named `sma_{period}({source})`.
    pub fn of(source: Arc<dyn Indicator>, period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}({})", source.name()),
            source: vec![source],
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> &[Arc<dyn Indicator>] {
        &self.source
    }

    fn calculate(&self, candles: &[Candle]) -> Vec<Option<f64>> {
        let values = source_values(candles, self.source.first());
        let n = values.len();
        let mut result = vec![None; n];

        let mut sum = 0.0;
        let mut missing = 0usize;
        for i in 0..n {
            match values[i] {
                Some(v) => sum += v,
                None => missing += 1,
            }
            if i >= self.period {
                match values[i - self.period] {
                    Some(v) => sum -= v,
                    None => missing -= 1,
                }
            }
            if i + 1 >= self.period && missing == 0 {
                result[i] = Some(sum / self.period as f64);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    #[test]
    fn sma_5_basic() {
        let candles = make_candles(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let result = Sma::new(5).calculate(&candles);

        assert_eq!(result.len(), 7);
        for (i, value) in result.iter().enumerate().take(4) {
            assert!(value.is_none(), "expected no value at index {i}");
        }
        // SMA[4] = mean(10,11,12,13,14) = 12.0
        assert_approx(result[4], 12.0, DEFAULT_EPSILON);
        assert_approx(result[5], 13.0, DEFAULT_EPSILON);
        assert_approx(result[6], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_1_is_close() {
        let candles = make_candles(&[100.0, 200.0, 300.0]);
        let result = Sma::new(1).calculate(&candles);
        assert_approx(result[0], 100.0, DEFAULT_EPSILON);
        assert_approx(result[2], 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_gap_blanks_every_window_it_touches() {
        let mut candles = make_candles(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        candles[2].close = f64::NAN;
        let result = Sma::new(3).calculate(&candles);
        assert!(result[2].is_none());
        assert!(result[3].is_none());
        assert!(result[4].is_none());
        // Window [13,14,15]
        assert_approx(result[5], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_too_few_candles() {
        let candles = make_candles(&[10.0, 11.0]);
        assert!(Sma::new(5).calculate(&candles).iter().all(Option::is_none));
    }

    #[test]
    fn sma_of_indicator_reads_attached_values() {
        let inner: Arc<dyn Indicator> = Arc::new(Sma::new(2));
        let outer = Sma::of(Arc::clone(&inner), 2);
        assert_eq!(outer.name(), "sma_2(sma_2)");
        assert_eq!(outer.dependencies().len(), 1);

        let mut candles = make_candles(&[10.0, 12.0, 14.0, 16.0]);
        let inner_values = inner.calculate(&candles);
        for (candle, value) in candles.iter_mut().zip(inner_values) {
            if let Some(v) = value {
                candle.set_indicator(inner.name(), v);
            }
        }
        // inner: [-, 11, 13, 15] -> outer: [-, -, 12, 14]
        let result = outer.calculate(&candles);
        assert!(result[1].is_none());
        assert_approx(result[2], 12.0, DEFAULT_EPSILON);
        assert_approx(result[3], 14.0, DEFAULT_EPSILON);
    }
}
