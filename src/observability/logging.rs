//! Structured logging.
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level so operators can raise
//!   verbosity without touching the config file
//! - Initialization is idempotent; a second call is a no-op

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `level` is used when `RUST_LOG` is unset.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level));

    // Fails only if a subscriber is already installed
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(format!("skyroute_gateway={level},tower_http={level}"))
        .unwrap_or_else(|_| EnvFilter::new("skyroute_gateway=info,tower_http=info"))
}
