//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Route panics through the log before exiting
//!
//! # Design Decisions
//! - Log level from `RUST_LOG`, with a crate-scoped default
//! - A panic anywhere means internal state can no longer be trusted, so the
//!   process exits with status 1 instead of limping on

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "collab_gateway=info,tower_http=info";

/// Install the global subscriber. Call once, first thing in `main`.
pub fn init() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Log any panic and terminate the process with status 1.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown".into());
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".into());

        tracing::error!(location = %location, panic = %payload, "An uncaught panic has occurred");
        tracing::error!("Process will exit now.");
        std::process::exit(1);
    }));
}
