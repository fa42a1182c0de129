//! Logging configuration.
//!
//! The crate is a library; embedding applications call
//! [`init_stderr_logging`] once at startup, or install their own
//! `tracing` subscriber.

use tracing_subscriber::EnvFilter;

/// Initializes logging to stderr.
///
/// The filter is taken from `RUST_LOG` when set, defaulting to `info`.
/// Calling this more than once panics; use [`try_init_stderr_logging`]
/// when initialization may race with another subscriber.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Like [`init_stderr_logging`] but ignores an already-installed
/// subscriber. Convenient in tests.
pub fn try_init_stderr_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}
