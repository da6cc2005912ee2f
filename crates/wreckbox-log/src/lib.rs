//! Structured logging for the Wreckbox engine.
//!
//! Engine crates emit through `tracing`; this crate wires up the subscriber
//! once at startup with console output, uptime timestamps, and
//! environment-based filtering (respects `RUST_LOG`), optionally overridden
//! by the config's `debug.log_level`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use wreckbox_config::Config;

/// Initializes the global tracing subscriber.
///
/// Filter precedence: `RUST_LOG` environment variable, then the config's
/// `debug.log_level`, then `"info"`. Calling twice is a no-op (the second
/// init fails quietly), so tests and embedding hosts can both call it.
pub fn init_logging(config: Option<&Config>) {
    let filter_str = config
        .map(|c| c.debug.log_level.as_str())
        .filter(|level| !level.is_empty())
        .unwrap_or("info");

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init();
}
