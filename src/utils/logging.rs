//! Structured logging setup.
//!
//! Thin wrapper around `tracing-subscriber` driven by [`LoggingConfig`].

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level when set. Calling
/// this twice is a no-op; the second call's subscriber is discarded.
pub fn init(config: &LoggingConfig) {
    let fallback = match config.log_level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        Level::ERROR => "error",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}={fallback}", env!("CARGO_CRATE_NAME"))));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if config.json_format {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}
