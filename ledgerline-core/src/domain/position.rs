//! Position: per-instrument aggregate of filled orders.
//!
//! Built and mutated only by the portfolio. Everyone else sees `&Position`.

use super::ids::PositionId;
use super::order::{Order, OrderKind, Side};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionStatus {
    Open,
    PartiallyOpen,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PositionError {
    #[error("cannot open a position from a non-entry order")]
    InvalidOrderType,
    #[error("order quantity must be positive")]
    InvalidQuantity,
    #[error("order {0} has not been filled")]
    Unfilled(String),
    #[error("order instrument {order} does not match position instrument {position}")]
    InstrumentMismatch { order: String, position: String },
    #[error("{order} entry cannot add to a {position} position")]
    SideMismatch { order: Side, position: Side },
    #[error("{order}x entry cannot add to a {position}x position")]
    LeverageMismatch { order: f64, position: f64 },
    #[error("exit quantity {requested} exceeds position size {open}")]
    QuantityExceedsPosition { requested: u64, open: u64 },
    #[error("position {0} is already closed")]
    AlreadyClosed(String),
}

/// An open or closed position.
///
/// Invariants: `quantity == 0` exactly when `status == Closed`; a position that
/// has been partially exited and still holds units is `PartiallyOpen`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    id: PositionId,
    instrument: String,
    side: Side,
    quantity: u64,
    /// Total units ever entered (average-ins included).
    entered_quantity: u64,
    open_price: f64,
    close_price: Option<f64>,
    open_time: DateTime<Utc>,
    close_time: Option<DateTime<Utc>>,
    status: PositionStatus,
    leverage: f64,
    orders: Vec<Order>,

    stop_loss: Option<f64>,
    take_profit: Option<f64>,
    highest_price: f64,
    lowest_price: f64,
    max_drawdown: f64,
    unrealized_pnl: f64,
    realized_pnl: f64,
    /// Best price seen since entry (max for longs, min for shorts). Never reverses.
    trailing_stop_high: f64,
}

impl Position {
    /// Open a position from a filled entry order.
    pub fn new(order: &Order) -> Result<Self, PositionError> {
        if order.kind() != OrderKind::Entry {
            return Err(PositionError::InvalidOrderType);
        }
        if order.quantity() == 0 {
            return Err(PositionError::InvalidQuantity);
        }
        let (price, time) = execution(order)?;

        Ok(Self {
            id: PositionId::next(),
            instrument: order.instrument().to_string(),
            side: order.side(),
            quantity: order.quantity(),
            entered_quantity: order.quantity(),
            open_price: price,
            close_price: None,
            open_time: time,
            close_time: None,
            status: PositionStatus::Open,
            leverage: order.leverage().max(1.0),
            orders: vec![order.clone()],
            stop_loss: order.stop_loss(),
            take_profit: order.take_profit(),
            highest_price: price,
            lowest_price: price,
            max_drawdown: 0.0,
            unrealized_pnl: 0.0,
            realized_pnl: 0.0,
            trailing_stop_high: price,
        })
    }

    /// Apply a filled order: entries average in, exits reduce and realize PnL.
    ///
    /// Nothing is mutated when an error is returned.
    pub fn add_order(&mut self, order: &Order) -> Result<(), PositionError> {
        if order.instrument() != self.instrument {
            return Err(PositionError::InstrumentMismatch {
                order: order.instrument().to_string(),
                position: self.instrument.clone(),
            });
        }
        if order.quantity() == 0 {
            return Err(PositionError::InvalidQuantity);
        }
        if self.status == PositionStatus::Closed {
            return Err(PositionError::AlreadyClosed(self.id.to_string()));
        }
        let (price, time) = execution(order)?;

        match order.kind() {
            OrderKind::Entry => {
                if order.side() != self.side {
                    return Err(PositionError::SideMismatch {
                        order: order.side(),
                        position: self.side,
                    });
                }
                // One leverage per position: PnL and the entry debit must agree.
                let leverage = order.leverage().max(1.0);
                if leverage != self.leverage {
                    return Err(PositionError::LeverageMismatch {
                        order: leverage,
                        position: self.leverage,
                    });
                }
                let total_value =
                    self.open_price * self.quantity as f64 + price * order.quantity() as f64;
                let new_quantity = self.quantity + order.quantity();
                self.open_price = total_value / new_quantity as f64;
                self.quantity = new_quantity;
                self.entered_quantity += order.quantity();
            }
            OrderKind::Exit => {
                if order.quantity() > self.quantity {
                    return Err(PositionError::QuantityExceedsPosition {
                        requested: order.quantity(),
                        open: self.quantity,
                    });
                }

                self.realized_pnl += self.pnl_at(price, order.quantity());
                self.quantity -= order.quantity();

                if self.quantity == 0 {
                    self.status = PositionStatus::Closed;
                    self.close_price = Some(price);
                    self.close_time = Some(time);
                } else {
                    self.status = PositionStatus::PartiallyOpen;
                }
            }
        }

        // Re-mark the remaining units at the execution price.
        self.unrealized_pnl = self.pnl_at(price, self.quantity);
        self.orders.push(order.clone());
        Ok(())
    }

    /// Update rolling extremes, unrealized PnL, drawdown, and the trailing anchor.
    pub fn update_price(&mut self, current_price: f64) {
        if self.status == PositionStatus::Closed || !current_price.is_finite() {
            return;
        }

        self.highest_price = self.highest_price.max(current_price);
        self.lowest_price = self.lowest_price.min(current_price);
        self.unrealized_pnl = self.pnl_at(current_price, self.quantity);

        let drawdown = match self.side {
            Side::Long if self.highest_price > 0.0 => {
                (self.highest_price - current_price) / self.highest_price
            }
            Side::Short if self.lowest_price > 0.0 => {
                (current_price - self.lowest_price) / self.lowest_price
            }
            _ => 0.0,
        };
        self.max_drawdown = self.max_drawdown.max(drawdown);

        self.trailing_stop_high = match self.side {
            Side::Long => self.trailing_stop_high.max(current_price),
            Side::Short => self.trailing_stop_high.min(current_price),
        };
    }

    /// Leveraged PnL of `quantity` units marked at `price`.
    pub fn pnl_at(&self, price: f64, quantity: u64) -> f64 {
        self.side.sign() * quantity as f64 * (price - self.open_price) * self.leverage
    }

    /// Leveraged notional exposure at `price`.
    pub fn value(&self, price: f64) -> f64 {
        self.quantity as f64 * price * self.leverage
    }

    /// `(realized + unrealized) / (open_price * quantity)`.
    ///
    /// Once closed the denominator uses every unit that was entered.
    pub fn roi(&self) -> f64 {
        let units = if self.quantity > 0 {
            self.quantity
        } else {
            self.entered_quantity
        };
        let investment = self.open_price * units as f64;
        if investment == 0.0 {
            return 0.0;
        }
        (self.realized_pnl + self.unrealized_pnl) / investment
    }

    /// Open-to-close time, or open-to-`now` while still open.
    pub fn duration(&self, now: DateTime<Utc>) -> Duration {
        match self.close_time {
            Some(closed) => closed - self.open_time,
            None => now - self.open_time,
        }
    }

    pub fn id(&self) -> &PositionId {
        &self.id
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn entered_quantity(&self) -> u64 {
        self.entered_quantity
    }

    pub fn open_price(&self) -> f64 {
        self.open_price
    }

    pub fn close_price(&self) -> Option<f64> {
        self.close_price
    }

    pub fn open_time(&self) -> DateTime<Utc> {
        self.open_time
    }

    pub fn close_time(&self) -> Option<DateTime<Utc>> {
        self.close_time
    }

    pub fn status(&self) -> PositionStatus {
        self.status
    }

    pub fn is_closed(&self) -> bool {
        self.status == PositionStatus::Closed
    }

    pub fn leverage(&self) -> f64 {
        self.leverage
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn stop_loss(&self) -> Option<f64> {
        self.stop_loss
    }

    pub fn take_profit(&self) -> Option<f64> {
        self.take_profit
    }

    pub fn highest_price(&self) -> f64 {
        self.highest_price
    }

    pub fn lowest_price(&self) -> f64 {
        self.lowest_price
    }

    pub fn max_drawdown(&self) -> f64 {
        self.max_drawdown
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.unrealized_pnl
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    pub fn trailing_stop_high(&self) -> f64 {
        self.trailing_stop_high
    }
}

fn execution(order: &Order) -> Result<(f64, DateTime<Utc>), PositionError> {
    match (order.price(), order.filled_at()) {
        (Some(price), Some(time)) => Ok((price, time)),
        _ => Err(PositionError::Unfilled(order.id().to_string())),
    }
}
