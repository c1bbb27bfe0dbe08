//! Structured logging for the options ledger.
//!
//! Installs a `tracing-subscriber` fmt layer behind an `EnvFilter`:
//! `RUST_LOG` wins when set, otherwise the configured level applies.
//!
//! # Example
//!
//! ```ignore
//! use options_ledger::config::LoggingConfig;
//! use options_ledger::observability::init_tracing;
//!
//! init_tracing(&LoggingConfig::default()).expect("Failed to initialize tracing");
//! ```

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Error type for tracing operations.
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    /// The configured level is not a valid filter directive.
    #[error("invalid log filter '{filter}': {message}")]
    InvalidFilter {
        /// Directive that failed to parse.
        filter: String,
        /// Parser message.
        message: String,
    },
    /// Failed to initialize tracing subscriber.
    #[error("failed to initialize tracing subscriber: {0}")]
    SubscriberError(String),
}

/// Build the filter: `RUST_LOG` if set, else `level`.
///
/// # Errors
///
/// Returns an error if `level` is not a valid filter directive.
pub fn env_filter(level: &str) -> Result<EnvFilter, TracingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    filter_for_level(level)
}

fn filter_for_level(level: &str) -> Result<EnvFilter, TracingError> {
    EnvFilter::try_new(level).map_err(|e| TracingError::InvalidFilter {
        filter: level.to_string(),
        message: e.to_string(),
    })
}

/// Install the global subscriber.
///
/// Formats: `json` (one object per event, with span context when
/// `include_spans` is set), `pretty`, and `compact` (anything else).
///
/// # Errors
///
/// Returns an error if the level does not parse or a global subscriber is
/// already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TracingError> {
    let filter = env_filter(&config.level)?;
    let spans = config.include_spans;

    let fmt_layer = match config.format.as_str() {
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(spans)
            .with_span_list(spans)
            .boxed(),
        "pretty" => tracing_subscriber::fmt::layer().pretty().boxed(),
        _ => tracing_subscriber::fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TracingError::SubscriberError(e.to_string()))?;

    tracing::debug!(
        level = %config.level,
        format = %config.format,
        "Tracing initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_directives_parse() {
        assert!(filter_for_level("info").is_ok());
        assert!(filter_for_level("warn,options_ledger=debug").is_ok());
    }

    #[test]
    fn test_bad_level_is_reported() {
        let Err(err) = filter_for_level("options_ledger=loud") else {
            panic!("expected invalid filter");
        };
        assert!(err.to_string().contains("options_ledger=loud"));
    }

    #[test]
    fn test_tracing_error_display() {
        let err = TracingError::SubscriberError("already initialized".to_string());
        assert!(err.to_string().contains("already initialized"));
    }
}
