//! Diagnostic logging.
//!
//! Events go to stderr so stdout carries only the run report. Verbosity is
//! controlled with `RUST_LOG` (default `warn`), e.g. `RUST_LOG=spiral_fit=debug`.

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "warn";

/// Install the global subscriber. A second call is a no-op.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
