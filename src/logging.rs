//! Default `tracing` setup for hosts that do not install their own subscriber.

use tracing_subscriber::EnvFilter;

/// Installs a global fmt subscriber filtered by `RUST_LOG`, or `default_level`
/// when the variable is unset or invalid.
///
/// Returns `false` if a global subscriber was already installed.
///
/// ```rust
/// chaos_safeguards::init_tracing("info");
/// assert!(!chaos_safeguards::init_tracing("debug"));
/// ```
pub fn init_tracing(default_level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
