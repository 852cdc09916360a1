//! Performance metrics over an equity curve and closed-trade PnLs.
//!
//! Pure functions with no dependency on the runner. Ratios are annualized with
//! `periods_per_year`, the number of equity snapshots in a year (252 for
//! daily bars).

use crate::config::MetricsConfig;
use ledgerline_core::Position;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub cagr: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub calmar: f64,
    /// Negative fraction, e.g. -0.15 for a 15% peak-to-trough fall.
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub trade_count: usize,
}

impl PerformanceMetrics {
    pub fn compute(equity: &[f64], trade_pnls: &[f64], config: &MetricsConfig) -> Self {
        let periods = config.periods_per_year;
        let cagr = cagr(equity, periods);
        let max_drawdown = max_drawdown(equity);
        Self {
            total_return: total_return(equity),
            cagr,
            sharpe: sharpe_ratio(equity, config.risk_free_rate, periods),
            sortino: sortino_ratio(equity, config.risk_free_rate, periods),
            calmar: calmar_ratio(cagr, max_drawdown),
            max_drawdown,
            win_rate: win_rate(trade_pnls),
            profit_factor: profit_factor(trade_pnls),
            trade_count: trade_pnls.len(),
        }
    }
}

/// Realized PnL of each closed position, in close order.
pub fn trade_pnls(closed: &[Position]) -> Vec<f64> {
    closed.iter().map(|p| p.realized_pnl()).collect()
}

fn endpoints(equity: &[f64]) -> Option<(f64, f64)> {
    match equity {
        [first, .., last] if *first > 0.0 => Some((*first, *last)),
        _ => None,
    }
}

/// (final - initial) / initial.
pub fn total_return(equity: &[f64]) -> f64 {
    endpoints(equity).map_or(0.0, |(first, last)| (last - first) / first)
}

/// Compound annual growth rate. 0.0 when the curve ends at or below zero.
pub fn cagr(equity: &[f64], periods_per_year: f64) -> f64 {
    let Some((first, last)) = endpoints(equity) else {
        return 0.0;
    };
    let years = (equity.len() - 1) as f64 / periods_per_year;
    if last <= 0.0 || years <= 0.0 {
        return 0.0;
    }
    (last / first).powf(1.0 / years) - 1.0
}

/// Annualized Sharpe ratio of per-period returns in excess of the risk-free rate.
///
/// 0.0 with fewer than two returns or zero variance.
pub fn sharpe_ratio(equity: &[f64], risk_free_rate: f64, periods_per_year: f64) -> f64 {
    let excess = excess_returns(equity, risk_free_rate, periods_per_year);
    if excess.len() < 2 {
        return 0.0;
    }
    let std = std_dev(&excess);
    if std < 1e-15 {
        return 0.0;
    }
    mean(&excess) / std * periods_per_year.sqrt()
}

/// Annualized Sortino ratio. Downside deviation is taken over all periods,
/// counting only the negative excess returns.
pub fn sortino_ratio(equity: &[f64], risk_free_rate: f64, periods_per_year: f64) -> f64 {
    let excess = excess_returns(equity, risk_free_rate, periods_per_year);
    if excess.len() < 2 {
        return 0.0;
    }
    let downside: f64 = excess.iter().filter(|r| **r < 0.0).map(|r| r * r).sum();
    let downside_std = (downside / excess.len() as f64).sqrt();
    if downside_std < 1e-15 {
        return 0.0;
    }
    mean(&excess) / downside_std * periods_per_year.sqrt()
}

/// CAGR / |max drawdown|. 0.0 without a drawdown or without growth.
pub fn calmar_ratio(cagr: f64, max_drawdown: f64) -> f64 {
    if max_drawdown >= 0.0 || cagr <= 0.0 {
        return 0.0;
    }
    cagr / max_drawdown.abs()
}

/// Largest peak-to-trough fall as a negative fraction.
pub fn max_drawdown(equity: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0_f64;
    for &value in equity {
        peak = peak.max(value);
        if peak > 0.0 {
            worst = worst.min((value - peak) / peak);
        }
    }
    worst
}

/// Fraction of trades with positive PnL.
pub fn win_rate(pnls: &[f64]) -> f64 {
    if pnls.is_empty() {
        return 0.0;
    }
    pnls.iter().filter(|p| **p > 0.0).count() as f64 / pnls.len() as f64
}

/// Gross profit / gross loss, capped at 100.
pub fn profit_factor(pnls: &[f64]) -> f64 {
    let profit: f64 = pnls.iter().filter(|p| **p > 0.0).sum();
    let loss: f64 = pnls.iter().filter(|p| **p < 0.0).map(|p| p.abs()).sum();
    if loss < 1e-10 {
        return if profit > 0.0 { 100.0 } else { 0.0 };
    }
    (profit / loss).min(100.0)
}

/// Simple returns between consecutive snapshots. A non-positive base yields 0.
pub fn period_returns(equity: &[f64]) -> Vec<f64> {
    equity
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

fn excess_returns(equity: &[f64], risk_free_rate: f64, periods_per_year: f64) -> Vec<f64> {
    let per_period_rf = risk_free_rate / periods_per_year;
    period_returns(equity)
        .into_iter()
        .map(|r| r - per_period_rf)
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1).
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}
