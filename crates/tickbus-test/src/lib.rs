//! Tickbus Test - shared test utilities for the tickbus workspace.
//!
//! Use as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! tickbus-test.workspace = true
//! ```
//!
//! Then record deliveries in tests:
//!
//! ```rust
//! use tickbus_test::CallLog;
//!
//! let log = CallLog::new();
//! let on_pair = log.recorder::<(i32, f64)>("L1");
//! on_pair(&(1, 2.0));
//! assert_eq!(log.entries(), vec!["L1(1, 2.0)"]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod logging;

pub use fixtures::*;
pub use logging::init_test_logging;
