//! Tracing subscriber initialization.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Initialize the global tracing subscriber from configuration.
///
/// The `TTP_ATLAS_LOG` environment variable overrides the configured
/// level. Safe to call once per process; embedding hosts that install
/// their own subscriber should skip this.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_env("TTP_ATLAS_LOG")
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    if config.json {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt().with_env_filter(filter).with_target(false).init();
    }
}
