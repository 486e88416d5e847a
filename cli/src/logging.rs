//! Diagnostic tracing for the `treemand` binary.
//!
//! Library crates only emit `tracing` events; this installs the subscriber.
//! Output goes to stderr so it never mixes with the rendered tree.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes the global subscriber.
///
/// Reads `RUST_LOG`; defaults to `warn`, or `debug` when `debug` is set.
///
/// ```bash
/// RUST_LOG=treemand_discovery=debug treemand kubectl
/// ```
pub fn init(debug: bool) {
    let fallback = if debug { "debug" } else { "warn" };
    let filter = if debug {
        EnvFilter::new(fallback)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
