//! Logging setup for binaries built on Pairplay.

use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, defaulting to
/// `info`.
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place.
pub fn init() {
    init_with_default("info");
}

/// Like [`init`], with a different filter when `RUST_LOG` is unset.
pub fn init_with_default(directives: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives)),
        )
        .with_target(false)
        .try_init();
}
