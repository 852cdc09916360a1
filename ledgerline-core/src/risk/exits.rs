//! Exit evaluation for a single position.
//!
//! Levels come from the position's own stop/target when the entry order set
//! them, else from the configured rates applied to the open price. The
//! trailing level follows the best price seen, including the price being
//! evaluated.

use super::RiskSettings;
use crate::domain::{Position, Side};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    TrailingStop,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLoss => write!(f, "stop_loss"),
            ExitReason::TakeProfit => write!(f, "take_profit"),
            ExitReason::TrailingStop => write!(f, "trailing_stop"),
        }
    }
}

/// Risk projection of an open position at a price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRisk {
    pub stop_loss_price: Option<f64>,
    pub take_profit_price: Option<f64>,
    pub trailing_stop_price: Option<f64>,
    /// Leveraged loss if price moves from here to the stop. Zero without a stop.
    pub max_loss: f64,
    /// Distance to target over distance to stop. Zero without both levels.
    pub risk_reward_ratio: f64,
}

pub fn stop_loss_level(pos: &Position, settings: &RiskSettings) -> Option<f64> {
    pos.stop_loss().or_else(|| {
        settings.use_stop_loss.then(|| match pos.side() {
            Side::Long => pos.open_price() * (1.0 - settings.stop_loss_rate),
            Side::Short => pos.open_price() * (1.0 + settings.stop_loss_rate),
        })
    })
}

pub fn take_profit_level(pos: &Position, settings: &RiskSettings) -> Option<f64> {
    pos.take_profit().or_else(|| {
        settings.use_take_profit.then(|| match pos.side() {
            Side::Long => pos.open_price() * (1.0 + settings.take_profit_rate),
            Side::Short => pos.open_price() * (1.0 - settings.take_profit_rate),
        })
    })
}

pub fn trailing_stop_level(pos: &Position, settings: &RiskSettings, price: f64) -> Option<f64> {
    if !settings.use_trailing_stop {
        return None;
    }
    let level = match pos.side() {
        Side::Long => pos.trailing_stop_high().max(price) * (1.0 - settings.trailing_stop_rate),
        Side::Short => pos.trailing_stop_high().min(price) * (1.0 + settings.trailing_stop_rate),
    };
    Some(level)
}

/// First triggered rule in stop-loss, take-profit, trailing-stop order.
pub fn evaluate_exit(pos: &Position, price: f64, settings: &RiskSettings) -> Option<ExitReason> {
    let crossed_against = |level: f64| match pos.side() {
        Side::Long => price <= level,
        Side::Short => price >= level,
    };
    let crossed_for = |level: f64| match pos.side() {
        Side::Long => price >= level,
        Side::Short => price <= level,
    };

    if stop_loss_level(pos, settings).is_some_and(crossed_against) {
        return Some(ExitReason::StopLoss);
    }
    if take_profit_level(pos, settings).is_some_and(crossed_for) {
        return Some(ExitReason::TakeProfit);
    }
    if trailing_stop_level(pos, settings, price).is_some_and(crossed_against) {
        return Some(ExitReason::TrailingStop);
    }
    None
}

pub fn position_risk(pos: &Position, price: f64, settings: &RiskSettings) -> PositionRisk {
    let stop = stop_loss_level(pos, settings);
    let target = take_profit_level(pos, settings);

    let max_loss = stop
        .map(|s| pos.quantity() as f64 * (price - s).abs() * pos.leverage())
        .unwrap_or(0.0);

    let risk_reward_ratio = match (stop, target) {
        (Some(s), Some(t)) => {
            let risk = (price - s).abs();
            if risk == 0.0 {
                0.0
            } else {
                (t - price).abs() / risk
            }
        }
        _ => 0.0,
    };

    PositionRisk {
        stop_loss_price: stop,
        take_profit_price: target,
        trailing_stop_price: trailing_stop_level(pos, settings, price),
        max_loss,
        risk_reward_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Order;
    use chrono::{TimeZone, Utc};

    fn position(side: Side, price: f64) -> Position {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 16, 0, 0).unwrap();
        let order = Order::entry("AAPL", side, 10).unwrap().filled(price, at).unwrap();
        Position::new(&order).unwrap()
    }

    #[test]
    fn long_stop_loss_triggers_at_or_below_level() {
        let pos = position(Side::Long, 100.0);
        let settings = RiskSettings::default().with_stop_loss(0.05);
        assert_eq!(evaluate_exit(&pos, 94.0, &settings), Some(ExitReason::StopLoss));
        assert_eq!(evaluate_exit(&pos, 96.0, &settings), None);
    }

    #[test]
    fn short_levels_are_mirrored() {
        let pos = position(Side::Short, 100.0);
        let settings = RiskSettings::default()
            .with_stop_loss(0.05)
            .with_take_profit(0.10);
        assert_eq!(evaluate_exit(&pos, 106.0, &settings), Some(ExitReason::StopLoss));
        assert_eq!(evaluate_exit(&pos, 89.0, &settings), Some(ExitReason::TakeProfit));
        assert_eq!(evaluate_exit(&pos, 100.0, &settings), None);
    }

    #[test]
    fn stop_loss_wins_over_trailing_stop() {
        let pos = position(Side::Long, 100.0);
        let settings = RiskSettings::default()
            .with_stop_loss(0.05)
            .with_trailing_stop(0.02);
        assert_eq!(evaluate_exit(&pos, 90.0, &settings), Some(ExitReason::StopLoss));
    }

    #[test]
    fn trailing_stop_follows_the_anchor() {
        let mut pos = position(Side::Long, 100.0);
        let settings = RiskSettings::default().with_trailing_stop(0.10);
        pos.update_price(120.0);
        // level = 120 * 0.9 = 108
        assert_eq!(evaluate_exit(&pos, 110.0, &settings), None);
        assert_eq!(evaluate_exit(&pos, 107.0, &settings), Some(ExitReason::TrailingStop));
    }

    #[test]
    fn trailing_stop_includes_the_evaluated_price() {
        let pos = position(Side::Short, 100.0);
        let settings = RiskSettings::default().with_trailing_stop(0.10);
        // anchor = min(100, 80) = 80, level = 88
        let level = trailing_stop_level(&pos, &settings, 80.0).unwrap();
        assert!((level - 88.0).abs() < 1e-9);
        assert_eq!(evaluate_exit(&pos, 80.0, &settings), None);
    }

    #[test]
    fn position_levels_override_rates() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 16, 0, 0).unwrap();
        let order = Order::entry("AAPL", Side::Long, 10)
            .unwrap()
            .with_stop_loss(80.0)
            .filled(100.0, at)
            .unwrap();
        let pos = Position::new(&order).unwrap();
        let settings = RiskSettings::default().with_stop_loss(0.05);
        assert_eq!(stop_loss_level(&pos, &settings), Some(80.0));
        assert_eq!(evaluate_exit(&pos, 90.0, &settings), None);
        assert_eq!(evaluate_exit(&pos, 80.0, &settings), Some(ExitReason::StopLoss));

        // Active even with no rate-based rule configured.
        assert_eq!(
            evaluate_exit(&pos, 79.0, &RiskSettings::default()),
            Some(ExitReason::StopLoss)
        );
    }

    #[test]
    fn risk_projection() {
        let pos = position(Side::Long, 100.0);
        let settings = RiskSettings::default()
            .with_stop_loss(0.05)
            .with_take_profit(0.10);
        let risk = position_risk(&pos, 100.0, &settings);
        assert!((risk.stop_loss_price.unwrap() - 95.0).abs() < 1e-9);
        assert!((risk.take_profit_price.unwrap() - 110.0).abs() < 1e-9);
        assert_eq!(risk.trailing_stop_price, None);
        assert!((risk.max_loss - 50.0).abs() < 1e-9);
        assert!((risk.risk_reward_ratio - 2.0).abs() < 1e-9);
    }

    #[test]
    fn risk_projection_without_rules_is_empty() {
        let pos = position(Side::Long, 100.0);
        let risk = position_risk(&pos, 100.0, &RiskSettings::default());
        assert_eq!(risk.stop_loss_price, None);
        assert_eq!(risk.max_loss, 0.0);
        assert_eq!(risk.risk_reward_ratio, 0.0);
    }
}
