//! Risk rules: order validation and forced exits.
//!
//! - `settings`: limits and stop/target/trailing toggles
//! - `exits`: per-position exit evaluation and risk projection
//! - `manager`: the standard [`RiskManager`](crate::components::RiskManager)

pub mod exits;
pub mod manager;
pub mod settings;

pub use exits::{evaluate_exit, ExitReason, PositionRisk};
pub use manager::StandardRiskManager;
pub use settings::RiskSettings;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    #[error("position size {notional:.2} exceeds maximum allocation {limit:.2} for {instrument}")]
    AllocationExceeded {
        instrument: String,
        notional: f64,
        limit: f64,
    },
    #[error("order leverage {leverage:.2}x exceeds maximum {max:.2}x for {instrument}")]
    LeverageExceeded {
        instrument: String,
        leverage: f64,
        max: f64,
    },
    #[error("order for {0} has no price to validate against")]
    Unpriced(String),
    #[error("invalid risk settings: {0}")]
    InvalidSettings(String),
}
