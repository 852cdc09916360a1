//! Runner: the deterministic tick loop.
//!
//! Single-threaded. The portfolio has exactly one writer (this loop), and any
//! error aborts the run with the tick's timestamp attached.

use super::error::{Component, RunError, TickError};
use crate::components::{IndicatorSet, PortfolioManager, RiskManager, Strategy};
use crate::data::PriceHistory;
use crate::domain::{close_prices, EquitySnapshot, Order, OrderError, Tick};
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};

#[derive(Default)]
pub struct Runner {
    strategy: Option<Box<dyn Strategy>>,
    portfolio: Option<Box<dyn PortfolioManager>>,
    risk: Option<Box<dyn RiskManager>>,
    data: Option<PriceHistory>,
    indicators: Option<IndicatorSet>,
    current_time: Option<DateTime<Utc>>,
    equity_curve: Vec<EquitySnapshot>,
}

impl Runner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(self, strategy: impl Strategy + 'static) -> Self {
        self.with_boxed_strategy(Box::new(strategy))
    }

    pub fn with_boxed_strategy(mut self, strategy: Box<dyn Strategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_portfolio(mut self, portfolio: impl PortfolioManager + 'static) -> Self {
        self.portfolio = Some(Box::new(portfolio));
        self
    }

    pub fn with_risk_manager(mut self, risk: impl RiskManager + 'static) -> Self {
        self.risk = Some(Box::new(risk));
        self
    }

    pub fn with_data(mut self, data: PriceHistory) -> Self {
        self.data = Some(data);
        self
    }

    /// Indicators computed over the whole history before the first tick.
    pub fn with_indicators(mut self, indicators: IndicatorSet) -> Self {
        self.indicators = Some(indicators);
        self
    }

    /// Run every tick in time order. Clears any previous equity curve.
    pub fn run(&mut self) -> Result<(), RunError> {
        let strategy = self
            .strategy
            .as_deref_mut()
            .ok_or(RunError::MissingComponent(Component::Strategy))?;
        let portfolio = self
            .portfolio
            .as_deref_mut()
            .ok_or(RunError::MissingComponent(Component::Portfolio))?;
        let risk = self
            .risk
            .as_deref()
            .ok_or(RunError::MissingComponent(Component::RiskManager))?;
        let data = self
            .data
            .as_mut()
            .ok_or(RunError::MissingComponent(Component::Data))?;

        if let Some(indicators) = &self.indicators {
            data.apply_indicators(indicators)?;
        }

        self.equity_curve.clear();
        self.equity_curve.reserve(data.len());
        self.current_time = None;

        info!(
            ticks = data.len(),
            instruments = data.instruments().len(),
            initial_value = portfolio.value(),
            "run started"
        );

        strategy.set_portfolio(&*portfolio);
        let mut session = Session {
            strategy,
            portfolio,
            risk,
        };

        let mut current_day: Option<NaiveDate> = None;
        for (time, tick) in data.ticks() {
            self.current_time = Some(time);

            let day = time.date_naive();
            if current_day != Some(day) {
                if let Some(previous) = current_day {
                    session.strategy.on_day_end(previous);
                }
                session.strategy.on_day_start(day);
                current_day = Some(day);
            }

            let snapshot = session
                .process_tick(time, tick)
                .map_err(|source| RunError::Tick { at: time, source })?;
            self.equity_curve.push(snapshot);
        }
        if let Some(last) = current_day {
            session.strategy.on_day_end(last);
        }

        info!(
            ticks = self.equity_curve.len(),
            final_value = session.portfolio.value(),
            closed_positions = session.portfolio.closed_positions().len(),
            "run finished"
        );
        Ok(())
    }

    pub fn equity_curve(&self) -> &[EquitySnapshot] {
        &self.equity_curve
    }

    /// Time of the last tick processed.
    pub fn current_time(&self) -> Option<DateTime<Utc>> {
        self.current_time
    }

    pub fn portfolio(&self) -> Option<&dyn PortfolioManager> {
        self.portfolio.as_deref()
    }

    pub fn data(&self) -> Option<&PriceHistory> {
        self.data.as_ref()
    }
}

/// Borrowed collaborators for the duration of one run.
struct Session<'a> {
    strategy: &'a mut dyn Strategy,
    portfolio: &'a mut dyn PortfolioManager,
    risk: &'a dyn RiskManager,
}

impl Session<'_> {
    fn process_tick(&mut self, time: DateTime<Utc>, tick: &Tick) -> Result<EquitySnapshot, TickError> {
        let prices = close_prices(tick);
        self.portfolio.update_positions(&prices);
        debug!(%time, instruments = prices.len(), "positions marked");

        let exits = self.risk.check_position_exits(&*self.portfolio, &prices);
        for order in exits {
            self.submit(order, time, tick)?;
        }

        let orders = self.strategy.on_tick(time, tick, &*self.portfolio);
        for order in orders {
            self.submit(order, time, tick)?;
        }

        Ok(EquitySnapshot {
            time,
            total_value: self.portfolio.value(),
            cash: self.portfolio.cash(),
            open_positions: self.portfolio.positions().len(),
            unrealized_pnl: self.portfolio.unrealized_pnl(),
        })
    }

    /// Fill (if needed) → validate → commit → notify.
    fn submit(&mut self, mut order: Order, time: DateTime<Utc>, tick: &Tick) -> Result<(), TickError> {
        if !order.is_filled() {
            let price = match order.price() {
                Some(quoted) => quoted,
                None => tick
                    .get(order.instrument())
                    .map(|candle| candle.close)
                    .ok_or_else(|| {
                        OrderError::InvalidOrder(format!(
                            "no price for {} in this tick",
                            order.instrument()
                        ))
                    })?,
            };
            order.fill(price, time)?;
        }

        self.risk.validate_order(&*self.portfolio, &order)?;

        let had_position = self.portfolio.position(order.instrument()).is_some();
        let closed_before = self.portfolio.closed_positions().len();

        self.portfolio.process_order(&order)?;
        self.strategy.on_order_filled(&order);

        if !had_position {
            if let Some(opened) = self.portfolio.position(order.instrument()) {
                self.strategy.on_position_opened(opened);
            }
        }
        if self.portfolio.closed_positions().len() > closed_before {
            if let Some(closed) = self.portfolio.closed_positions().last() {
                self.strategy.on_position_closed(closed);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::NoOpStrategy;
    use crate::domain::Portfolio;
    use crate::risk::StandardRiskManager;

    #[test]
    fn missing_components_fail_preflight() {
        let mut runner = Runner::new();
        assert_eq!(
            runner.run(),
            Err(RunError::MissingComponent(Component::Strategy))
        );

        let mut runner = Runner::new().with_strategy(NoOpStrategy);
        assert_eq!(
            runner.run(),
            Err(RunError::MissingComponent(Component::Portfolio))
        );

        let mut runner = Runner::new()
            .with_strategy(NoOpStrategy)
            .with_portfolio(Portfolio::with_capital(1_000.0));
        assert_eq!(
            runner.run(),
            Err(RunError::MissingComponent(Component::RiskManager))
        );

        let mut runner = Runner::new()
            .with_strategy(NoOpStrategy)
            .with_portfolio(Portfolio::with_capital(1_000.0))
            .with_risk_manager(StandardRiskManager::permissive());
        assert_eq!(runner.run(), Err(RunError::MissingComponent(Component::Data)));
    }

    #[test]
    fn empty_history_runs_with_empty_curve() {
        let mut runner = Runner::new()
            .with_strategy(NoOpStrategy)
            .with_portfolio(Portfolio::with_capital(1_000.0))
            .with_risk_manager(StandardRiskManager::permissive())
            .with_data(PriceHistory::new());
        runner.run().unwrap();
        assert!(runner.equity_curve().is_empty());
        assert_eq!(runner.current_time(), None);
    }
}
