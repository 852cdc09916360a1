//! Backtest configuration: one TOML document per run.
//!
//! ```toml
//! [portfolio]
//! initial_capital = 10000.0
//! enable_shorts = true
//!
//! [risk]
//! use_stop_loss = true
//! stop_loss_rate = 0.05
//!
//! [data]
//! path = "prices.csv"
//!
//! [metrics]
//! risk_free_rate = 0.02
//!
//! [logging]
//! filter = "info,ledgerline_core=debug"
//! ```
//!
//! Every section is optional and every field falls back to its default.

use ledgerline_core::{PortfolioSettings, RiskSettings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub portfolio: PortfolioSettings,
    pub risk: RiskSettings,
    pub data: DataConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// CSV price file. Relative paths resolve against the config file's directory
    /// when loaded with [`BacktestConfig::load`].
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Annual risk-free rate as a fraction.
    pub risk_free_rate: f64,
    /// Equity snapshots per year, used to annualize Sharpe and Sortino.
    pub periods_per_year: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            periods_per_year: 252.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive applied by
    /// [`crate::logging::init_from`]. `RUST_LOG` takes precedence.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl BacktestConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;

        if let (Some(data), Some(dir)) = (config.data.path.as_mut(), path.parent()) {
            if data.is_relative() {
                *data = dir.join(&*data);
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let capital = self.portfolio.initial_capital;
        if !capital.is_finite() || capital <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "portfolio.initial_capital must be positive, got {capital}"
            )));
        }
        self.risk
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let rf = self.metrics.risk_free_rate;
        if !rf.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "metrics.risk_free_rate must be finite, got {rf}"
            )));
        }
        let periods = self.metrics.periods_per_year;
        if !periods.is_finite() || periods <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "metrics.periods_per_year must be positive, got {periods}"
            )));
        }
        Ok(())
    }

    /// Deterministic BLAKE3 hash of the config's JSON form.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}
