//! # Log setup for binaries.
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! application's call. [`init`] is what the bundled binary uses.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a compact fmt layer filtered by `RUST_LOG`, falling back to
/// `default_directive` (e.g. `"pickvisor=info"`).
///
/// Safe to call more than once: if a global subscriber is already set, the
/// call leaves it in place.
pub fn init(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).compact())
        .with(filter)
        .try_init();

    if installed.is_err() {
        tracing::debug!("global tracing subscriber already set");
    }
}
