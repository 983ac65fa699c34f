//! Process-wide tracing subscriber setup.

use tracing::warn;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global fmt subscriber. `RUST_LOG` takes precedence over
/// `log_level`; an unparsable level falls back to `info`.
pub fn init_logger(log_level: &str) {
    let (level, fallback) = match log_level.parse::<LevelFilter>() {
        Ok(level) => (level, false),
        Err(_) => (LevelFilter::INFO, true),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    // A subscriber may already be installed by tests sharing the process.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if fallback {
        warn!(message = "Invalid log level, using info", log_level);
    }
}
