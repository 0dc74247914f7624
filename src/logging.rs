//! Tracing subscriber setup for binaries built on this crate.
//!
//! The library itself only emits `tracing` events; nothing is printed unless
//! a subscriber is installed. Filtering follows `RUST_LOG` and defaults to
//! `info`.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber. Returns `false` if one was already set.
pub fn init_logging() -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init()
        .is_ok()
}
