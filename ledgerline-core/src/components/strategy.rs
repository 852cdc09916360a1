//! Strategy contract: turns ticks into orders.
//!
//! Every hook except `on_tick` is a notification with a no-op default, so a
//! strategy overrides only what it needs.

use super::portfolio::PortfolioManager;
use crate::domain::{Order, Position, Tick};
use chrono::{DateTime, NaiveDate, Utc};

pub trait Strategy {
    /// Called once before the first tick.
    fn set_portfolio(&mut self, _portfolio: &dyn PortfolioManager) {}

    /// Orders to submit for this tick. Unfilled orders are filled by the
    /// runner at their quoted price, else at the tick's close.
    fn on_tick(
        &mut self,
        time: DateTime<Utc>,
        tick: &Tick,
        portfolio: &dyn PortfolioManager,
    ) -> Vec<Order>;

    /// After every committed order, forced exits included.
    fn on_order_filled(&mut self, _order: &Order) {}

    /// After a commit creates a new position.
    fn on_position_opened(&mut self, _position: &Position) {}

    /// After a commit closes a position.
    fn on_position_closed(&mut self, _position: &Position) {}

    /// Before the first tick of each UTC calendar day.
    fn on_day_start(&mut self, _date: NaiveDate) {}

    /// After the last tick of each UTC calendar day.
    fn on_day_end(&mut self, _date: NaiveDate) {}
}

/// Strategy that never trades.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpStrategy;

impl Strategy for NoOpStrategy {
    fn on_tick(&mut self, _: DateTime<Utc>, _: &Tick, _: &dyn PortfolioManager) -> Vec<Order> {
        Vec::new()
    }
}

/// Closure-backed strategy. Only `on_tick` does anything.
pub struct FnStrategy<F> {
    on_tick: F,
}

impl<F> FnStrategy<F>
where
    F: FnMut(DateTime<Utc>, &Tick, &dyn PortfolioManager) -> Vec<Order>,
{
    pub fn new(on_tick: F) -> Self {
        Self { on_tick }
    }
}

impl<F> Strategy for FnStrategy<F>
where
    F: FnMut(DateTime<Utc>, &Tick, &dyn PortfolioManager) -> Vec<Order>,
{
    fn on_tick(
        &mut self,
        time: DateTime<Utc>,
        tick: &Tick,
        portfolio: &dyn PortfolioManager,
    ) -> Vec<Order> {
        (self.on_tick)(time, tick, portfolio)
    }
}
