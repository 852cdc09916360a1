//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (period + 1).
//! Seed: SMA of the first `period` values after any leading gap.
//! A gap after the seed blanks every later value.

use super::source_values;
use crate::components::Indicator;
use crate::domain::Candle;
use std::sync::Arc;

#[derive(Clone)]
pub struct Ema {
    period: usize,
    name: String,
    source: Vec<Arc<dyn Indicator>>,
}

impl Ema {
    /// EMA of close prices, named `ema_{period}`.
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
            source: Vec::new(),
        }
    }

    /// EMA of another indicator's values, named `ema_{period}({source})`.
    pub fn of(source: Arc<dyn Indicator>, period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}({})", source.name()),
            source: vec![source],
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Ema {
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

        let Some(start) = values.iter().position(Option::is_some) else {
            return result;
        };
        let seed_end = start + self.period;
        if seed_end > n {
            return result;
        }

        let mut sum = 0.0;
        for value in &values[start..seed_end] {
            match value {
                Some(v) => sum += v,
                None => return result,
            }
        }
        let seed = sum / self.period as f64;
        result[seed_end - 1] = Some(seed);

        let alpha = 2.0 / (self.period as f64 + 1.0);
        let mut prev = seed;
        for i in seed_end..n {
            let Some(x) = values[i] else {
                return result;
            };
            let ema = alpha * x + (1.0 - alpha) * prev;
            result[i] = Some(ema);
            prev = ema;
        }

        result
    }
}
