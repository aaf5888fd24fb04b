//! Opt-in tracing setup for processes embedding the engine.
//!
//! The library itself only emits `tracing` events; nothing here runs unless
//! an embedding asks for it. `RUST_LOG` overrides the default filter.

use tracing_error::ErrorLayer;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install a formatted subscriber with span-close events and error context.
///
/// Safe to call more than once; later calls are no-ops. Returns whether this
/// call installed the subscriber.
pub fn init_tracing() -> bool {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::CLOSE);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("error,loomboard=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .try_init()
        .is_ok()
}
