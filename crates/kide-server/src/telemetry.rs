//! Structured logging bootstrap (§10.2): a local console `tracing-subscriber` layer driven by
//! `RUST_LOG`, initialized once before any Kubernetes client is built. No OTLP exporters — those
//! are out of scope per §1's "process logger" exclusion.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(tracing_subscriber::fmt::layer()).init();
}
