//! Tick runner: binds strategy, portfolio, and risk manager over a price history.
//!
//! Per tick, in order:
//! 1. Mark open positions at close prices
//! 2. Push risk-forced exits through the order pipeline
//! 3. Push strategy orders through the order pipeline
//! 4. Append an equity snapshot of the post-tick state
//!
//! The order pipeline is fill → risk validation → commit → notify.

pub mod error;
pub mod runner;

pub use error::{Component, RunError, TickError};
pub use runner::Runner;
