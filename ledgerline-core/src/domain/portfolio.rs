//! Portfolio: cash, open positions, closed trades, and order history.
//!
//! The portfolio is the only writer of positions. An order is either fully
//! applied (position, cash, history) or rejected with no state change.

use super::order::{Order, OrderKind, Side};
use super::position::{Position, PositionError};
use super::Prices;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Account-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioSettings {
    pub initial_capital: f64,
    pub enable_shorts: bool,
    /// Leverage applied to entry orders placed at 1x.
    pub default_leverage: f64,
}

impl Default for PortfolioSettings {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            enable_shorts: false,
            default_leverage: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PortfolioError {
    #[error("invalid order: {0}")]
    InvalidOrder(String),
    #[error("short selling is disabled ({0})")]
    ShortsDisabled(String),
    #[error("insufficient cash: required {required:.2}, available {available:.2}")]
    InsufficientCash { required: f64, available: f64 },
    #[error("no open position for {0}")]
    NoOpenPosition(String),
    #[error("exit quantity {requested} exceeds open quantity {open} for {instrument}")]
    ExitExceedsSize {
        instrument: String,
        requested: u64,
        open: u64,
    },
    #[error("no position found for {0}")]
    NoPositionFound(String),
    #[error(transparent)]
    Position(#[from] PositionError),
}

/// Read-side metrics for a single position.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionMetrics {
    pub roi: f64,
    pub duration: Duration,
    pub max_drawdown: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
}

/// Aggregate counts and PnL totals over open and closed positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStats {
    pub total_value: f64,
    pub cash: f64,
    pub open_positions: usize,
    pub closed_positions: usize,
    /// Open positions with positive unrealized PnL. Flat ones count as losing.
    pub winning_positions: usize,
    pub losing_positions: usize,
    /// Closed trades with positive realized PnL. Break-even counts as losing.
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub unrealized_pnl: f64,
    /// Realized PnL of closed trades plus partial exits of open positions.
    pub realized_pnl: f64,
}

impl PortfolioStats {
    pub fn collect<'a>(
        total_value: f64,
        cash: f64,
        open: impl IntoIterator<Item = &'a Position>,
        closed: &[Position],
    ) -> Self {
        let mut stats = Self {
            total_value,
            cash,
            closed_positions: closed.len(),
            ..Self::default()
        };

        for pos in open {
            stats.open_positions += 1;
            stats.unrealized_pnl += pos.unrealized_pnl();
            stats.realized_pnl += pos.realized_pnl();
            if pos.unrealized_pnl() > 0.0 {
                stats.winning_positions += 1;
            } else {
                stats.losing_positions += 1;
            }
        }

        for pos in closed {
            stats.realized_pnl += pos.realized_pnl();
            if pos.realized_pnl() > 0.0 {
                stats.winning_trades += 1;
            } else {
                stats.losing_trades += 1;
            }
        }

        stats
    }

    /// Fraction of closed trades that were winners.
    pub fn win_rate(&self) -> f64 {
        if self.closed_positions == 0 {
            0.0
        } else {
            self.winning_trades as f64 / self.closed_positions as f64
        }
    }
}

/// Aggregate portfolio state.
#[derive(Debug, Clone, Serialize)]
pub struct Portfolio {
    cash: f64,
    open_positions: BTreeMap<String, Position>,
    closed_positions: Vec<Position>,
    order_history: Vec<Order>,
    settings: PortfolioSettings,
}

impl Portfolio {
    pub fn new(settings: PortfolioSettings) -> Self {
        let mut settings = settings;
        if !(settings.default_leverage.is_finite() && settings.default_leverage >= 1.0) {
            warn!(
                default_leverage = settings.default_leverage,
                "default leverage below 1, using 1"
            );
            settings.default_leverage = 1.0;
        }
        Self {
            cash: settings.initial_capital,
            open_positions: BTreeMap::new(),
            closed_positions: Vec::new(),
            order_history: Vec::new(),
            settings,
        }
    }

    /// Unlevered, long-only portfolio with the given starting cash.
    pub fn with_capital(initial_capital: f64) -> Self {
        Self::new(PortfolioSettings {
            initial_capital,
            ..PortfolioSettings::default()
        })
    }

    /// Validate and apply a filled order.
    pub fn process_order(&mut self, order: &Order) -> Result<(), PortfolioError> {
        self.validate_order(order)?;
        match order.kind() {
            OrderKind::Entry => self.handle_entry_order(order),
            OrderKind::Exit => self.handle_exit_order(order),
        }
    }

    /// Leverage an entry order will actually run at.
    ///
    /// Always finite and at least 1, so the cash gate, the debit, and the
    /// committed position agree.
    pub fn effective_leverage(&self, order: &Order) -> f64 {
        if order.leverage().is_finite() && order.leverage() > 1.0 {
            order.leverage()
        } else {
            self.settings.default_leverage
        }
    }

    fn validate_order(&self, order: &Order) -> Result<(), PortfolioError> {
        let Some(price) = order.price() else {
            return Err(PortfolioError::InvalidOrder(format!(
                "order {} for {} has no price",
                order.id(),
                order.instrument()
            )));
        };
        if !order.is_filled() {
            return Err(PortfolioError::InvalidOrder(format!(
                "order {} for {} is not filled",
                order.id(),
                order.instrument()
            )));
        }

        match order.kind() {
            OrderKind::Entry => {
                if order.side() == Side::Short && !self.settings.enable_shorts {
                    return Err(PortfolioError::ShortsDisabled(order.instrument().to_string()));
                }
                let required = order.quantity() as f64 * price / self.effective_leverage(order);
                if required > self.cash {
                    return Err(PortfolioError::InsufficientCash {
                        required,
                        available: self.cash,
                    });
                }
            }
            OrderKind::Exit => {
                let Some(pos) = self.open_positions.get(order.instrument()) else {
                    return Err(PortfolioError::NoOpenPosition(order.instrument().to_string()));
                };
                if order.quantity() > pos.quantity() {
                    return Err(PortfolioError::ExitExceedsSize {
                        instrument: order.instrument().to_string(),
                        requested: order.quantity(),
                        open: pos.quantity(),
                    });
                }
            }
        }
        Ok(())
    }

    fn handle_entry_order(&mut self, order: &Order) -> Result<(), PortfolioError> {
        let leverage = self.effective_leverage(order);
        let order = order.clone().at_leverage(leverage);
        let price = order.price().unwrap_or_default();

        match self.open_positions.get_mut(order.instrument()) {
            Some(pos) => pos.add_order(&order)?,
            None => {
                let pos = Position::new(&order)?;
                self.open_positions.insert(order.instrument().to_string(), pos);
            }
        }

        let debit = order.quantity() as f64 * price / leverage;
        self.cash -= debit;
        debug!(
            instrument = order.instrument(),
            side = %order.side(),
            quantity = order.quantity(),
            price,
            leverage,
            cash = self.cash,
            "entry committed"
        );
        self.order_history.push(order);
        Ok(())
    }

    fn handle_exit_order(&mut self, order: &Order) -> Result<(), PortfolioError> {
        let Some(pos) = self.open_positions.get_mut(order.instrument()) else {
            return Err(PortfolioError::NoPositionFound(order.instrument().to_string()));
        };
        pos.add_order(order)?;

        let price = order.price().unwrap_or_default();
        let proceeds = order.quantity() as f64 * price;
        self.cash += proceeds;

        if pos.is_closed() {
            if let Some(closed) = self.open_positions.remove(order.instrument()) {
                debug!(
                    instrument = order.instrument(),
                    realized_pnl = closed.realized_pnl(),
                    "position closed"
                );
                self.closed_positions.push(closed);
            }
        }

        debug!(
            instrument = order.instrument(),
            quantity = order.quantity(),
            price,
            cash = self.cash,
            "exit committed"
        );
        self.order_history.push(order.clone());
        Ok(())
    }

    /// Re-mark every open position that has a price in `prices`.
    pub fn update_positions(&mut self, prices: &Prices) {
        for (instrument, pos) in self.open_positions.iter_mut() {
            if let Some(&price) = prices.get(instrument) {
                pos.update_price(price);
            }
        }
    }

    /// Cash plus unrealized PnL of open positions.
    pub fn value(&self) -> f64 {
        self.cash + self.unrealized_pnl()
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.open_positions.values().map(Position::unrealized_pnl).sum()
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn settings(&self) -> &PortfolioSettings {
        &self.settings
    }

    pub fn positions(&self) -> &BTreeMap<String, Position> {
        &self.open_positions
    }

    pub fn position(&self, instrument: &str) -> Option<&Position> {
        self.open_positions.get(instrument)
    }

    pub fn has_position(&self, instrument: &str) -> bool {
        self.open_positions.contains_key(instrument)
    }

    pub fn closed_positions(&self) -> &[Position] {
        &self.closed_positions
    }

    pub fn order_history(&self) -> &[Order] {
        &self.order_history
    }

    /// Metrics for the open position on `instrument`, else its latest closed trade.
    pub fn position_metrics(
        &self,
        instrument: &str,
        now: DateTime<Utc>,
    ) -> Result<PositionMetrics, PortfolioError> {
        let pos = self
            .open_positions
            .get(instrument)
            .or_else(|| {
                self.closed_positions
                    .iter()
                    .rev()
                    .find(|p| p.instrument() == instrument)
            })
            .ok_or_else(|| PortfolioError::NoPositionFound(instrument.to_string()))?;

        Ok(PositionMetrics {
            roi: pos.roi(),
            duration: pos.duration(now),
            max_drawdown: pos.max_drawdown(),
            realized_pnl: pos.realized_pnl(),
            unrealized_pnl: pos.unrealized_pnl(),
        })
    }

    pub fn stats(&self) -> PortfolioStats {
        PortfolioStats::collect(
            self.value(),
            self.cash,
            self.open_positions.values(),
            &self.closed_positions,
        )
    }
}
