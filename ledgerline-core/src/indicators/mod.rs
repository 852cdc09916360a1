//! Concrete indicator implementations.
//!
//! Both moving averages read close prices by default, or the attached values
//! of another indicator when built with `of`, which makes that indicator a
//! dependency.

pub mod ema;
pub mod sma;

pub use ema::Ema;
pub use sma::Sma;

use crate::components::Indicator;
use crate::domain::Candle;
use std::sync::Arc;

/// Input series for a moving average: close prices or another indicator.
fn source_values(candles: &[Candle], source: Option<&Arc<dyn Indicator>>) -> Vec<Option<f64>> {
    match source {
        None => candles
            .iter()
            .map(|c| Some(c.close).filter(|v| v.is_finite()))
            .collect(),
        Some(dep) => candles.iter().map(|c| c.indicator(dep.name())).collect(),
    }
}

/// Create synthetic candles from close prices for testing.
///
/// open = prev_close (or close for the first candle), high/low = ±1 around
/// open/close, volume = 1000, one candle per day from 2024-01-02.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    use chrono::{Duration, TimeZone, Utc};
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 16, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle::new(
                base + Duration::days(i as i64),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
                1000,
            )
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: Option<f64>, expected: f64, epsilon: f64) {
    let Some(actual) = actual else {
        panic!("assert_approx failed: actual=None, expected={expected}");
    };
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
