//! Subscriber setup for binaries and tests that want log output.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::BacktestConfig;

/// Install a global fmt subscriber.
///
/// `RUST_LOG` wins over `filter`. An unparsable `filter` falls back to `info`.
/// Returns `false` if a global subscriber was already installed, in which
/// case nothing changes.
pub fn init(filter: &str) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| directive_filter(filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .is_ok()
}

/// [`init`] with the config's `[logging] filter`.
pub fn init_from(config: &BacktestConfig) -> bool {
    init(&config.logging.filter)
}

fn directive_filter(filter: &str) -> EnvFilter {
    EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"))
}
