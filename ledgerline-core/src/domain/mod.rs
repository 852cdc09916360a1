//! Domain types for the ledgerline engine.

pub mod candle;
pub mod equity;
pub mod ids;
pub mod order;
pub mod portfolio;
pub mod position;

use std::collections::BTreeMap;

pub use candle::Candle;
pub use equity::EquitySnapshot;
pub use ids::{OrderId, PositionId};
pub use order::{Order, OrderError, OrderKind, Side};
pub use portfolio::{Portfolio, PortfolioError, PortfolioSettings, PortfolioStats, PositionMetrics};
pub use position::{Position, PositionError, PositionStatus};

/// Instrument identifier (ticker symbol).
pub type Instrument = String;

/// One timestamped multi-instrument observation: instrument → candle.
pub type Tick = BTreeMap<Instrument, Candle>;

/// Instrument → mark price. Ordered so exit scans are deterministic.
pub type Prices = BTreeMap<Instrument, f64>;

/// Close price of every candle in a tick.
pub fn close_prices(tick: &Tick) -> Prices {
    tick.iter()
        .map(|(instrument, candle)| (instrument.clone(), candle.close))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn close_prices_maps_every_instrument() {
        let time = Utc.with_ymd_and_hms(2024, 1, 2, 16, 0, 0).unwrap();
        let mut tick = Tick::new();
        tick.insert("AAPL".into(), Candle::new(time, 99.0, 101.0, 98.0, 100.0, 10));
        tick.insert("MSFT".into(), Candle::new(time, 300.0, 305.0, 299.0, 302.5, 20));

        let prices = close_prices(&tick);
        assert_eq!(prices.len(), 2);
        assert_eq!(prices["AAPL"], 100.0);
        assert_eq!(prices["MSFT"], 302.5);
    }
}
