//! Component contracts: the pluggable collaborators the runner binds together.
//!
//! - Strategy: turns ticks into orders, receives lifecycle notifications
//! - Portfolio manager: the single writer of cash and positions
//! - Risk manager: validates orders and derives forced exits
//!
//! Plus the indicator trait and its dependency-ordered set.

pub mod indicator;
pub mod portfolio;
pub mod risk;
pub mod strategy;

pub use indicator::{CustomIndicator, Indicator, IndicatorError, IndicatorSet};
pub use portfolio::PortfolioManager;
pub use risk::RiskManager;
pub use strategy::{FnStrategy, NoOpStrategy, Strategy};
