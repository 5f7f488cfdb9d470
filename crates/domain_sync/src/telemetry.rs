//! Tracing setup for processes embedding the sync service

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Error)]
#[error("Failed to install tracing subscriber: {0}")]
pub struct TelemetryError(String);

/// Installs the global `fmt` subscriber
///
/// `RUST_LOG` wins over `log_level` when set; an unparseable level falls back
/// to `info`. Fails if a global subscriber is already installed.
///
/// # Arguments
///
/// * `log_level` - The minimum log level to output (trace, debug, info, warn, error)
pub fn init_tracing(log_level: &str) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .map_err(|e| TelemetryError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        // Another test in this binary may have installed a subscriber first.
        let _ = init_tracing("debug");
        assert!(init_tracing("debug").is_err());
    }
}
