//! Tickbus Telemetry - logging setup for tickbus hosts.
//!
//! This crate provides:
//! - A serializable [`LogConfig`] covering level, format and per-target directives
//! - One-call installation of a global `tracing` subscriber
//!
//! # Example
//!
//! ```rust,no_run
//! use tickbus_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), tickbus_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Pretty)
//!     .with_directive("tickbus_events=trace");
//!
//! setup_logging(&config)?;
//! tracing::info!("Logging ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};
