#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Configuration for the tickbus host.
//!
//! A single [`Config`] type holds the bus tuning and logging settings.
//!
//! # Usage
//!
//! ```rust
//! use tickbus_config::Config;
//!
//! let config = Config::from_toml_str("[bus]\ndrain_budget_micros = 500\n").unwrap();
//! assert_eq!(config.bus.drain_budget_micros, 500);
//! assert_eq!(config.logging.level, "info");
//! ```
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Environment variables** (`TICKBUS_DRAIN_BUDGET_MICROS`,
//!    `TICKBUS_WARN_ON_OVERRUN`, `TICKBUS_LOG_LEVEL`, `TICKBUS_LOG_FORMAT`)
//! 2. **Config file** passed to [`Config::load`]
//! 3. **Embedded defaults** (`defaults.toml` compiled into binary)
//!
//! # Design
//!
//! This crate has **no dependencies on other internal tickbus crates**.
//! Conversion to bus options and log settings happens in the host binary.

/// Environment variable overrides.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file loading.
pub mod loader;
/// TOML tree merging.
pub mod merge;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use types::{BusSection, Config, LoggingSection};

impl Config {
    /// Load configuration from defaults, an optional file, and the
    /// environment.
    ///
    /// See [`loader::load`] for the full algorithm.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file is unreadable or malformed, or
    /// the final configuration fails validation.
    pub fn load(path: Option<&std::path::Path>) -> ConfigResult<Self> {
        loader::load(path)
    }

    /// Load configuration from a single file (no environment overrides).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }

    /// Parse configuration from TOML text layered over the defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the text is malformed or fails
    /// validation.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        loader::from_toml_str(content)
    }
}
