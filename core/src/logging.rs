//! Tracing subscriber setup for test suites that use the client.
//!
//! The library itself only emits `tracing` events; installing a subscriber
//! is left to the binary or test harness. `init_logging` is a convenience
//! for the common case.

use crate::error::RestError;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable text
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

const DEFAULT_DIRECTIVES: &str = "restclient_core=info";

/// Install a global fmt subscriber.
///
/// `directives` uses `EnvFilter` syntax (`"restclient_core=debug,reqwest=warn"`);
/// `None` keeps the client's info-level events. Calling this when a global
/// subscriber is already installed is not an error.
pub fn init_logging(format: LogFormat, directives: Option<&str>) -> Result<(), RestError> {
    let filter = tracing_subscriber::EnvFilter::try_new(directives.unwrap_or(DEFAULT_DIRECTIVES))
        .map_err(|e| RestError::Config(format!("invalid log directives: {e}")))?;

    let result = match format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .with_current_span(true)
            .try_init(),
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.to_string().contains("already been set") => Ok(()),
        Err(e) => Err(RestError::Config(format!("failed to initialize logging: {e}"))),
    }
}
