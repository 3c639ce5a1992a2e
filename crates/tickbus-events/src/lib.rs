//! Tickbus Events - typed in-process publish/subscribe for tick-driven hosts.
//!
//! This crate provides:
//! - Event types declared as marker types with a fixed argument shape
//! - Synchronous broadcast that invokes every listener immediately
//! - Deferred broadcast drained in FIFO order under a per-tick time budget
//! - Finish callbacks that receive the broadcast arguments once delivery is done
//!
//! # Architecture
//!
//! Listeners register one callback per event type under a [`ListenerId`].
//! Deferred deliveries live in a single queue shared by all event types.
//! Each handler remembers which of its deliveries are still queued, so
//! unregistering a listener cancels exactly those deliveries and nothing else.
//!
//! The host drives the queue by calling [`EventBus::tick`] (or
//! [`EventBus::drain`] with an explicit budget) once per frame.
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use std::time::Duration;
//! use tickbus_events::{EventBus, ListenerId, define_event};
//!
//! define_event!(IntPair => (i32, f64));
//!
//! let bus = EventBus::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let sink = Arc::clone(&seen);
//! bus.register::<IntPair>(ListenerId::generate(), move |(a, b): &(i32, f64)| {
//!     sink.lock().unwrap().push(format!("{a} {b}"));
//! })
//! .unwrap();
//!
//! bus.broadcast_async::<IntPair>((1, 2.5)).unwrap();
//! assert!(seen.lock().unwrap().is_empty());
//!
//! let report = bus.drain(Duration::from_millis(5)).unwrap();
//! assert_eq!(report.executed, 1);
//! assert_eq!(*seen.lock().unwrap(), vec!["1 2.5"]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod bus;
mod error;
mod event;
mod handler;
mod listener;
mod queue;
mod registry;

pub use bus::{BusOptions, DEFAULT_DRAIN_BUDGET, DrainReport, EventBus};
pub use error::{BusError, BusResult};
pub use event::{Callback, Event, EventKey, RegistrationToken};
pub use listener::ListenerId;
