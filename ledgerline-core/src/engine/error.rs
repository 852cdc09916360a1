use crate::components::IndicatorError;
use crate::domain::{OrderError, PortfolioError};
use crate::risk::RiskError;
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// A collaborator the runner cannot start without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Strategy,
    Portfolio,
    RiskManager,
    Data,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Strategy => write!(f, "strategy"),
            Component::Portfolio => write!(f, "portfolio"),
            Component::RiskManager => write!(f, "risk manager"),
            Component::Data => write!(f, "data"),
        }
    }
}

/// Failure while processing a single tick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TickError {
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error("risk validation failed: {0}")]
    RiskValidationFailed(#[from] RiskError),
    #[error(transparent)]
    Portfolio(#[from] PortfolioError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    #[error("{0} not set")]
    MissingComponent(Component),
    #[error("indicator precompute failed: {0}")]
    Indicators(#[from] IndicatorError),
    #[error("tick {at}: {source}")]
    Tick {
        at: DateTime<Utc>,
        #[source]
        source: TickError,
    },
}
