//! Telemetry error types.

use thiserror::Error;

/// Errors raised while building or installing a subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Log format name not recognised.
    #[error("unknown log format '{0}' (expected pretty, compact or json)")]
    UnknownFormat(String),

    /// Level or directive string rejected by the filter parser.
    #[error("invalid filter '{filter}': {message}")]
    InvalidFilter {
        /// The offending level or directive.
        filter: String,
        /// Parser message.
        message: String,
    },

    /// A global subscriber was already installed.
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
