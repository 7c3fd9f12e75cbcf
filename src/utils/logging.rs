//! Logging initialization
//!
//! Logs go to stderr so the redirect report on stdout stays clean.
//! - Respects RUST_LOG environment variable
//! - Falls back to the filter from the config file or `--log-filter`
//! - Defaults to "warn"
//!
//! # Usage
//! ```rust,no_run
//! use dependency_fixup::utils::init_logging;
//!
//! init_logging(None); // Uses RUST_LOG or defaults to "warn"
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Filter used when neither RUST_LOG nor a configured filter is set
pub const DEFAULT_LOG_FILTER: &str = "warn";

fn build_filter(filter: Option<&str>) -> EnvFilter {
    // RUST_LOG always takes precedence
    if std::env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }
    EnvFilter::new(filter.unwrap_or(DEFAULT_LOG_FILTER))
}

/// Initialize human-readable logging
///
/// # Arguments
/// * `filter` - Optional log filter (e.g., "info", "dependency_fixup::module=debug").
///              If None, uses RUST_LOG or defaults to "warn"
pub fn init_logging(filter: Option<&str>) {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(std::env::var("NO_COLOR").is_err()),
        )
        .with(build_filter(filter))
        .init();
}

/// Initialize logging with JSON output
#[cfg(feature = "json-logging")]
pub fn init_json_logging(filter: Option<&str>) {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_current_span(true)
                .with_span_list(true),
        )
        .with(build_filter(filter))
        .init();
}

/// Initialize logging from the `[logging]` config section
pub fn init_logging_from_config(config: &LoggingConfig) {
    let filter = config.filter.as_deref();

    if config.json_format {
        #[cfg(feature = "json-logging")]
        {
            init_json_logging(filter);
        }
        #[cfg(not(feature = "json-logging"))]
        {
            // Fall back to regular logging if json-logging feature not enabled
            init_logging(filter);
        }
    } else {
        init_logging(filter);
    }
}
