//! Errors raised while loading configuration.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a configuration could not be produced.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The config file is larger than the loader accepts.
    #[error("{} is {size} bytes; config files are limited to {limit} bytes", path.display())]
    TooLarge {
        /// Offending file.
        path: PathBuf,
        /// Size read.
        size: u64,
        /// Accepted maximum.
        limit: u64,
    },

    /// TOML text was malformed or had the wrong shape.
    #[error("cannot parse {origin}: {source}")]
    Parse {
        /// File path, or a placeholder such as `<string>` for in-memory text.
        origin: String,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A value parsed but is outside its accepted range or set.
    #[error("invalid `{field}`: {message}")]
    Invalid {
        /// Dotted path of the rejected field.
        field: String,
        /// What was wrong with it.
        message: String,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
