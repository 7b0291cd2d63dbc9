//! Structured logging setup.
//!
//! The core only emits `tracing` events; installing a subscriber is left to
//! the host, which can call [`init_tracing`] or bring its own.

use tracing_subscriber::EnvFilter;

use crate::common::config::LogFormat;
use crate::common::error::{LifecycleError, LifecycleResult};

/// Install the global subscriber. `RUST_LOG` controls the filter
/// (defaulting to `info`); `format` picks JSON lines or pretty output.
pub fn init_tracing(format: LogFormat) -> LifecycleResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(filter)
            .try_init(),
    };

    result.map_err(|e| LifecycleError::invalid_config(format!("tracing init failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_an_error_not_a_panic() {
        let _ = init_tracing(LogFormat::Json);
        assert!(init_tracing(LogFormat::Pretty).is_err());
    }
}
