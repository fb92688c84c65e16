//! Subscriber setup.
//!
//! Library code logs through the `log` facade and opens `tracing` spans.
//! [`init`] installs one `tracing-subscriber` fmt subscriber and forwards
//! `log` records into it, so both end up in the same output.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

use crate::config::LoggingConfig;

static INITIALIZED: OnceLock<()> = OnceLock::new();

/// Builds the filter: `RUST_LOG` wins over the configured level.
fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.as_str()))
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init(config: &LoggingConfig) {
    INITIALIZED.get_or_init(|| {
        let registry = tracing_subscriber::registry().with(env_filter(config));
        let result = if config.json {
            tracing::subscriber::set_global_default(
                registry.with(fmt::layer().json().with_current_span(true)),
            )
        } else {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().with_target(true)))
        };

        if result.is_err() {
            // Someone else owns the global subscriber; leave it alone.
            return;
        }
        if let Err(e) = tracing_log::LogTracer::init() {
            tracing::debug!("log records are not forwarded: {}", e);
        }
    });
}
