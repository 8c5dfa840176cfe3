//! Tracing subscriber setup for the binary.
//!
//! Logs go to stderr so stdout carries only the report. `RUST_LOG` overrides
//! the default filter.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_DIRECTIVE: &str = "cost_scaling=info";

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    // A second init (e.g. from tests) is harmless; keep the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
