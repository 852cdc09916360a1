//! Price history storage.

pub mod history;

pub use history::{HistoryError, PriceHistory, Ticks};
