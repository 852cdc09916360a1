use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account value recorded after each tick. Append-only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquitySnapshot {
    pub time: DateTime<Utc>,
    pub total_value: f64,
    pub cash: f64,
    pub open_positions: usize,
    pub unrealized_pnl: f64,
}
