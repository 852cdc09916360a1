//! Standard risk manager: allocation and leverage limits on entries, plus
//! stop-loss / take-profit / trailing-stop forced exits.

use super::exits::{self, ExitReason, PositionRisk};
use super::{RiskError, RiskSettings};
use crate::components::{PortfolioManager, RiskManager};
use crate::domain::{Order, Position, Prices};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct StandardRiskManager {
    settings: RiskSettings,
}

impl StandardRiskManager {
    pub fn new(settings: RiskSettings) -> Result<Self, RiskError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    /// Manager with every check disabled.
    pub fn permissive() -> Self {
        Self {
            settings: RiskSettings::default(),
        }
    }

    pub fn settings(&self) -> &RiskSettings {
        &self.settings
    }

    pub fn evaluate_exit(&self, position: &Position, price: f64) -> Option<ExitReason> {
        exits::evaluate_exit(position, price, &self.settings)
    }

    pub fn position_risk(&self, position: &Position, price: f64) -> PositionRisk {
        exits::position_risk(position, price, &self.settings)
    }
}

impl RiskManager for StandardRiskManager {
    /// Exits always pass; they only reduce exposure.
    fn validate_order(&self, portfolio: &dyn PortfolioManager, order: &Order) -> Result<(), RiskError> {
        if !order.is_entry() {
            return Ok(());
        }
        let price = order
            .price()
            .ok_or_else(|| RiskError::Unpriced(order.instrument().to_string()))?;

        if self.settings.max_position_allocation_rate > 0.0 {
            let notional = order.quantity() as f64 * price;
            let limit = portfolio.value() * self.settings.max_position_allocation_rate;
            if notional > limit {
                return Err(RiskError::AllocationExceeded {
                    instrument: order.instrument().to_string(),
                    notional,
                    limit,
                });
            }
        }

        if self.settings.max_leverage > 0.0 {
            let leverage = portfolio.effective_leverage(order);
            if leverage > self.settings.max_leverage {
                return Err(RiskError::LeverageExceeded {
                    instrument: order.instrument().to_string(),
                    leverage,
                    max: self.settings.max_leverage,
                });
            }
        }

        Ok(())
    }

    fn check_position_exits(&self, portfolio: &dyn PortfolioManager, prices: &Prices) -> Vec<Order> {
        let mut orders = Vec::new();

        for (instrument, pos) in portfolio.positions() {
            let Some(&price) = prices.get(instrument) else {
                continue;
            };
            let Some(reason) = self.evaluate_exit(pos, price) else {
                continue;
            };

            match Order::exit(instrument.as_str(), pos.side().opposite(), pos.quantity()) {
                Ok(order) => {
                    info!(
                        instrument = instrument.as_str(),
                        %reason,
                        price,
                        quantity = pos.quantity(),
                        "exit condition met"
                    );
                    orders.push(order.with_price(price));
                }
                Err(err) => warn!(instrument = instrument.as_str(), %err, "could not build exit order"),
            }
        }

        orders
    }
}
