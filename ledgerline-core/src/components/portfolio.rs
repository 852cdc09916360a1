//! Portfolio manager contract.
//!
//! The runner depends on this trait, not on [`Portfolio`], so alternate
//! accounting policies can be substituted without touching the tick loop.

use crate::domain::{Order, Portfolio, PortfolioError, PortfolioStats, Position, Prices};
use std::collections::BTreeMap;

pub trait PortfolioManager {
    /// Validate and apply one filled order. On error nothing changes.
    fn process_order(&mut self, order: &Order) -> Result<(), PortfolioError>;

    /// Re-mark open positions against the latest prices.
    fn update_positions(&mut self, prices: &Prices);

    fn value(&self) -> f64;

    fn cash(&self) -> f64;

    /// Open positions keyed by instrument.
    fn positions(&self) -> &BTreeMap<String, Position>;

    fn closed_positions(&self) -> &[Position];

    /// Leverage an entry order would be committed at.
    fn effective_leverage(&self, order: &Order) -> f64 {
        order.leverage()
    }

    fn position(&self, instrument: &str) -> Option<&Position> {
        self.positions().get(instrument)
    }

    fn unrealized_pnl(&self) -> f64 {
        self.positions().values().map(Position::unrealized_pnl).sum()
    }

    fn stats(&self) -> PortfolioStats {
        PortfolioStats::collect(
            self.value(),
            self.cash(),
            self.positions().values(),
            self.closed_positions(),
        )
    }
}

impl PortfolioManager for Portfolio {
    fn process_order(&mut self, order: &Order) -> Result<(), PortfolioError> {
        Portfolio::process_order(self, order)
    }

    fn update_positions(&mut self, prices: &Prices) {
        Portfolio::update_positions(self, prices)
    }

    fn value(&self) -> f64 {
        Portfolio::value(self)
    }

    fn cash(&self) -> f64 {
        Portfolio::cash(self)
    }

    fn positions(&self) -> &BTreeMap<String, Position> {
        Portfolio::positions(self)
    }

    fn effective_leverage(&self, order: &Order) -> f64 {
        Portfolio::effective_leverage(self, order)
    }

    fn closed_positions(&self) -> &[Position] {
        Portfolio::closed_positions(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Side;
    use chrono::{TimeZone, Utc};

    #[test]
    fn trait_stats_match_concrete_stats() {
        let mut portfolio = Portfolio::with_capital(10_000.0);
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 16, 0, 0).unwrap();
        let order = Order::entry("AAPL", Side::Long, 10)
            .unwrap()
            .filled(100.0, at)
            .unwrap();

        let manager: &mut dyn PortfolioManager = &mut portfolio;
        manager.process_order(&order).unwrap();
        manager.update_positions(&Prices::from([("AAPL".to_string(), 105.0)]));

        assert_eq!(manager.unrealized_pnl(), 50.0);
        assert_eq!(manager.position("AAPL").map(Position::quantity), Some(10));
        let via_trait = manager.stats();
        assert_eq!(via_trait, portfolio.stats());
    }
}
