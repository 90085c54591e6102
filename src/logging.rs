//! Logging configuration for sigma-query.
//!
//! Logs always go to stderr so that stdout carries only the decoded records.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "info";

/// Returns the filter from `RUST_LOG`, or `verbose`-dependent default.
pub fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("sigma_query=debug,info")
        } else {
            EnvFilter::new(DEFAULT_FILTER)
        }
    })
}

/// Initializes logging to stderr.
pub fn init_stderr_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr)
        .init();
}
