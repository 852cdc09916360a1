//! Backtest runner: wires configuration, price data, and a strategy into the
//! core tick loop and summarizes the result.
//!
//! Two entry points:
//! - `run_backtest()`: takes pre-loaded price history.
//! - `run_backtest_from_config()`: loads the CSV named by `[data] path` first.

use chrono::{DateTime, Utc};
use ledgerline_core::engine::Component;
use ledgerline_core::{
    EquitySnapshot, IndicatorSet, Portfolio, PortfolioManager, PortfolioStats, PriceHistory,
    RiskError, RunError, Runner, StandardRiskManager, Strategy,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{load_csv, LoadError};
use crate::metrics::{trade_pnls, PerformanceMetrics};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("risk settings: {0}")]
    Risk(#[from] RiskError),
    #[error("run failed: {0}")]
    Run(#[from] RunError),
    #[error("no [data] path configured")]
    NoDataPath,
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub run_id: RunId,
    /// Time of the first tick, `None` for an empty history.
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub initial_capital: f64,
    pub final_capital: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub metrics: PerformanceMetrics,
    pub equity_curve: Vec<EquitySnapshot>,
    /// Portfolio statistics after the last tick.
    pub stats: PortfolioStats,
}

impl BacktestReport {
    pub fn max_drawdown(&self) -> f64 {
        self.metrics.max_drawdown
    }

    pub fn sharpe(&self) -> f64 {
        self.metrics.sharpe
    }

    pub fn sortino(&self) -> f64 {
        self.metrics.sortino
    }

    pub fn total_return(&self) -> f64 {
        self.metrics.total_return
    }
}

/// Load the configured CSV, then run.
pub fn run_backtest_from_config(
    config: &BacktestConfig,
    strategy: Box<dyn Strategy>,
    indicators: Option<IndicatorSet>,
) -> Result<BacktestReport, BacktestError> {
    let path = config
        .data
        .path
        .as_deref()
        .ok_or(BacktestError::NoDataPath)?;
    let data = load_csv(path)?;
    run_backtest(config, data, strategy, indicators)
}

/// Run a backtest over pre-loaded data: no I/O.
pub fn run_backtest(
    config: &BacktestConfig,
    data: PriceHistory,
    strategy: Box<dyn Strategy>,
    indicators: Option<IndicatorSet>,
) -> Result<BacktestReport, BacktestError> {
    config.validate()?;
    let run_id = config.run_id()?;
    let risk = StandardRiskManager::new(config.risk.clone())?;
    let portfolio = Portfolio::new(config.portfolio.clone());
    let initial_capital = portfolio.cash();

    info!(%run_id, initial_capital, "backtest starting");

    let mut runner = Runner::new()
        .with_boxed_strategy(strategy)
        .with_portfolio(portfolio)
        .with_risk_manager(risk)
        .with_data(data);
    if let Some(indicators) = indicators {
        runner = runner.with_indicators(indicators);
    }
    runner.run()?;

    let portfolio = runner
        .portfolio()
        .ok_or(RunError::MissingComponent(Component::Portfolio))?;
    let curve = runner.equity_curve().to_vec();

    // The initial capital is the curve's base, so returns include the first tick.
    let values: Vec<f64> = std::iter::once(initial_capital)
        .chain(curve.iter().map(|s| s.total_value))
        .collect();
    let pnls = trade_pnls(portfolio.closed_positions());
    let metrics = PerformanceMetrics::compute(&values, &pnls, &config.metrics);
    let stats = portfolio.stats();

    let report = BacktestReport {
        run_id,
        start: curve.first().map(|s| s.time),
        end: curve.last().map(|s| s.time),
        initial_capital,
        final_capital: portfolio.value(),
        total_trades: stats.closed_positions,
        winning_trades: stats.winning_trades,
        losing_trades: stats.losing_trades,
        metrics,
        equity_curve: curve,
        stats,
    };

    info!(
        run_id = %report.run_id,
        final_capital = report.final_capital,
        trades = report.total_trades,
        total_return = report.metrics.total_return,
        "backtest finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerline_core::NoOpStrategy;

    #[test]
    fn empty_history_reports_flat_result() {
        let config = BacktestConfig::default();
        let report =
            run_backtest(&config, PriceHistory::new(), Box::new(NoOpStrategy), None).unwrap();
        assert_eq!(report.start, None);
        assert_eq!(report.final_capital, 100_000.0);
        assert_eq!(report.total_trades, 0);
        assert_eq!(report.total_return(), 0.0);
        assert!(report.equity_curve.is_empty());
        assert_eq!(report.run_id, config.run_id().unwrap());
    }

    #[test]
    fn invalid_config_is_rejected_before_running() {
        let mut config = BacktestConfig::default();
        config.risk.use_stop_loss = true;
        let err = run_backtest(&config, PriceHistory::new(), Box::new(NoOpStrategy), None)
            .unwrap_err();
        assert!(matches!(err, BacktestError::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_data_path_is_reported() {
        let err = run_backtest_from_config(&BacktestConfig::default(), Box::new(NoOpStrategy), None)
            .unwrap_err();
        assert!(matches!(err, BacktestError::NoDataPath));
    }
}
