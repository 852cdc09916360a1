//! Risk manager contract.

use super::portfolio::PortfolioManager;
use crate::domain::{Order, Prices};
use crate::risk::RiskError;

/// Validates proposed orders and derives forced exits.
///
/// Both calls see the portfolio read-only; no state is kept between calls
/// beyond what lives on the positions themselves.
pub trait RiskManager {
    fn validate_order(&self, portfolio: &dyn PortfolioManager, order: &Order) -> Result<(), RiskError>;

    /// At most one full-size exit per open position with a known price.
    fn check_position_exits(&self, portfolio: &dyn PortfolioManager, prices: &Prices) -> Vec<Order>;
}
