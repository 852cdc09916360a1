//! Ledgerline Runner: backtest orchestration on top of `ledgerline-core`.
//!
//! This crate provides:
//! - TOML backtest configuration with a content-addressed run id
//! - CSV price loading into a `PriceHistory`
//! - `tracing` subscriber setup
//! - Performance metrics over the equity curve
//! - A single-backtest entry point producing a serializable report

pub mod config;
pub mod data_loader;
pub mod logging;
pub mod metrics;
pub mod runner;

pub use config::{BacktestConfig, ConfigError, DataConfig, LoggingConfig, MetricsConfig, RunId};
pub use data_loader::{load_csv, load_csv_reader, LoadError};
pub use metrics::PerformanceMetrics;
pub use runner::{run_backtest, run_backtest_from_config, BacktestError, BacktestReport};
