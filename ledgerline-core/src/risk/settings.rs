use super::RiskError;
use serde::{Deserialize, Serialize};

/// Risk limits. Rates are fractions (0.05 = 5%).
///
/// A zero `max_leverage` or `max_position_allocation_rate` disables that check.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSettings {
    pub max_leverage: f64,
    /// Largest entry notional as a fraction of portfolio value.
    pub max_position_allocation_rate: f64,

    pub use_stop_loss: bool,
    pub stop_loss_rate: f64,
    pub use_take_profit: bool,
    pub take_profit_rate: f64,
    pub use_trailing_stop: bool,
    pub trailing_stop_rate: f64,
}

impl RiskSettings {
    pub fn validate(&self) -> Result<(), RiskError> {
        let rates = [
            ("max_leverage", self.max_leverage),
            ("max_position_allocation_rate", self.max_position_allocation_rate),
            ("stop_loss_rate", self.stop_loss_rate),
            ("take_profit_rate", self.take_profit_rate),
            ("trailing_stop_rate", self.trailing_stop_rate),
        ];
        for (name, value) in rates {
            if !value.is_finite() || value < 0.0 {
                return Err(RiskError::InvalidSettings(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        if self.max_leverage > 0.0 && self.max_leverage < 1.0 {
            return Err(RiskError::InvalidSettings(format!(
                "max_leverage must be 0 (unlimited) or at least 1, got {}",
                self.max_leverage
            )));
        }

        let rules = [
            ("stop_loss", self.use_stop_loss, self.stop_loss_rate, true),
            ("take_profit", self.use_take_profit, self.take_profit_rate, false),
            ("trailing_stop", self.use_trailing_stop, self.trailing_stop_rate, true),
        ];
        for (name, enabled, rate, below_one) in rules {
            if !enabled {
                continue;
            }
            if rate == 0.0 {
                return Err(RiskError::InvalidSettings(format!(
                    "{name} is enabled with a zero rate"
                )));
            }
            if below_one && rate >= 1.0 {
                return Err(RiskError::InvalidSettings(format!(
                    "{name}_rate must be below 1, got {rate}"
                )));
            }
        }

        Ok(())
    }

    pub fn with_stop_loss(mut self, rate: f64) -> Self {
        self.use_stop_loss = true;
        self.stop_loss_rate = rate;
        self
    }

    pub fn with_take_profit(mut self, rate: f64) -> Self {
        self.use_take_profit = true;
        self.take_profit_rate = rate;
        self
    }

    pub fn with_trailing_stop(mut self, rate: f64) -> Self {
        self.use_trailing_stop = true;
        self.trailing_stop_rate = rate;
        self
    }

    pub fn any_exit_rule(&self) -> bool {
        self.use_stop_loss || self.use_take_profit || self.use_trailing_stop
    }
}
