//! Structured logging.
//!
//! # Responsibilities
//! - Install the global tracing subscriber
//! - Pick the log level from the environment or the config
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - Installing twice is reported, not fatal (tests share one process)

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter for `level`, unless `RUST_LOG` is set.
pub fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("front_controller={level},tower_http={level}")))
}

/// Install the global subscriber. Returns false if one was already set.
pub fn init(level: &str) -> bool {
    tracing_subscriber::registry()
        .with(filter(level))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
