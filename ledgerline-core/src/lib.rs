//! Ledgerline Core: order lifecycle, portfolio accounting, risk rules, tick runner.
//!
//! This crate contains the simulation engine:
//! - Domain types (candles, orders, positions, portfolio, equity snapshots)
//! - Component contracts (strategy, portfolio manager, risk manager, indicator)
//! - Price history store with lazy chronological ordering
//! - Stop-loss / take-profit / trailing-stop risk manager
//! - Deterministic tick runner that binds strategy, portfolio, and risk together

pub mod components;
pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod risk;

pub use components::{
    CustomIndicator, FnStrategy, Indicator, IndicatorSet, NoOpStrategy, PortfolioManager,
    RiskManager, Strategy,
};
pub use data::PriceHistory;
pub use domain::{
    Candle, EquitySnapshot, Order, OrderKind, Portfolio, PortfolioSettings, PortfolioStats,
    Position, PositionStatus, Prices, Side, Tick,
};
pub use engine::{RunError, Runner, TickError};
pub use risk::{ExitReason, RiskError, RiskSettings, StandardRiskManager};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: core domain types are Send + Sync.
    ///
    /// Indicator precompute fans out across threads; the values it touches
    /// must cross thread boundaries.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Candle>();
        require_sync::<domain::Candle>();
        require_send::<domain::Order>();
        require_sync::<domain::Order>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::Portfolio>();
        require_sync::<domain::Portfolio>();
        require_send::<domain::EquitySnapshot>();
        require_sync::<domain::EquitySnapshot>();
        require_send::<data::PriceHistory>();
        require_sync::<data::PriceHistory>();
        require_send::<risk::StandardRiskManager>();
        require_sync::<risk::StandardRiskManager>();
        require_send::<components::IndicatorSet>();
        require_sync::<components::IndicatorSet>();
    }

    /// Architecture contract: risk exit scans only see the portfolio read-only.
    ///
    /// `check_position_exits` takes `&dyn PortfolioManager`; if someone widens
    /// it to `&mut`, this stops compiling.
    #[test]
    fn risk_manager_reads_portfolio_immutably() {
        fn _check(
            risk: &dyn components::RiskManager,
            portfolio: &dyn components::PortfolioManager,
            prices: &domain::Prices,
        ) -> Vec<domain::Order> {
            risk.check_position_exits(portfolio, prices)
        }
    }
}
