//! Orders: the immutable intent records that drive every position mutation.

use super::ids::OrderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Direction of exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }

    /// +1 for long, -1 for short. PnL is `sign * quantity * (price - open)`.
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "Long"),
            Side::Short => write!(f, "Short"),
        }
    }
}

/// Whether an order opens/adds to a position or reduces/closes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    Entry,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderError {
    #[error("invalid order: {0}")]
    InvalidOrder(String),
    #[error("order {0} is already filled")]
    AlreadyFilled(OrderId),
}

/// A trading order.
///
/// Quantity is a positive whole number of units. Leverage is at least 1.
/// `price` is either a quote set before submission or the execution price
/// stamped by [`Order::fill`]; once filled the order never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    instrument: String,
    side: Side,
    kind: OrderKind,
    quantity: u64,
    price: Option<f64>,
    leverage: f64,
    filled_at: Option<DateTime<Utc>>,
    stop_loss: Option<f64>,
    take_profit: Option<f64>,
}

impl Order {
    /// Create an unfilled order. Non-positive leverage defaults to 1; NaN and
    /// infinite leverage are rejected.
    pub fn new(
        instrument: impl Into<String>,
        side: Side,
        kind: OrderKind,
        quantity: u64,
        leverage: f64,
    ) -> Result<Self, OrderError> {
        let instrument = instrument.into();
        if quantity == 0 {
            return Err(OrderError::InvalidOrder(format!(
                "quantity must be positive for {instrument}"
            )));
        }
        if instrument.trim().is_empty() {
            return Err(OrderError::InvalidOrder("instrument must not be empty".into()));
        }
        if !leverage.is_finite() {
            return Err(OrderError::InvalidOrder(format!(
                "leverage {leverage} for {instrument} must be finite"
            )));
        }

        Ok(Self {
            id: OrderId::next(),
            instrument,
            side,
            kind,
            quantity,
            price: None,
            leverage: if leverage <= 0.0 { 1.0 } else { leverage },
            filled_at: None,
            stop_loss: None,
            take_profit: None,
        })
    }

    /// Unlevered entry order.
    pub fn entry(instrument: impl Into<String>, side: Side, quantity: u64) -> Result<Self, OrderError> {
        Self::new(instrument, side, OrderKind::Entry, quantity, 1.0)
    }

    /// Exit order. `side` is the side of the trade (opposite of the position).
    pub fn exit(instrument: impl Into<String>, side: Side, quantity: u64) -> Result<Self, OrderError> {
        Self::new(instrument, side, OrderKind::Exit, quantity, 1.0)
    }

    /// Quote a price before submission. The runner fills at this price.
    pub fn with_price(mut self, price: f64) -> Self {
        if self.filled_at.is_none() {
            self.price = Some(price);
        }
        self
    }

    /// Replace the leverage. Used by the portfolio to apply its default leverage.
    pub(crate) fn at_leverage(mut self, leverage: f64) -> Self {
        self.leverage = if leverage.is_finite() && leverage >= 1.0 { leverage } else { 1.0 };
        self
    }

    /// Absolute stop-loss level carried onto the position this order opens.
    pub fn with_stop_loss(mut self, price: f64) -> Self {
        self.stop_loss = Some(price);
        self
    }

    /// Absolute take-profit level carried onto the position this order opens.
    pub fn with_take_profit(mut self, price: f64) -> Self {
        self.take_profit = Some(price);
        self
    }

    /// Stamp execution price and time. An order can only be filled once.
    pub fn fill(&mut self, price: f64, at: DateTime<Utc>) -> Result<(), OrderError> {
        if self.filled_at.is_some() {
            return Err(OrderError::AlreadyFilled(self.id.clone()));
        }
        if !price.is_finite() || price <= 0.0 {
            return Err(OrderError::InvalidOrder(format!(
                "fill price {price} for {} must be positive",
                self.instrument
            )));
        }
        self.price = Some(price);
        self.filled_at = Some(at);
        Ok(())
    }

    /// Builder form of [`Order::fill`].
    pub fn filled(mut self, price: f64, at: DateTime<Utc>) -> Result<Self, OrderError> {
        self.fill(price, at)?;
        Ok(self)
    }

    pub fn id(&self) -> &OrderId {
        &self.id
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn kind(&self) -> OrderKind {
        self.kind
    }

    pub fn is_entry(&self) -> bool {
        self.kind == OrderKind::Entry
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn price(&self) -> Option<f64> {
        self.price
    }

    pub fn leverage(&self) -> f64 {
        self.leverage
    }

    pub fn filled_at(&self) -> Option<DateTime<Utc>> {
        self.filled_at
    }

    pub fn is_filled(&self) -> bool {
        self.filled_at.is_some()
    }

    pub fn stop_loss(&self) -> Option<f64> {
        self.stop_loss
    }

    pub fn take_profit(&self) -> Option<f64> {
        self.take_profit
    }

    /// `quantity * price`, zero while unpriced.
    pub fn notional(&self) -> f64 {
        self.quantity as f64 * self.price.unwrap_or(0.0)
    }
}
