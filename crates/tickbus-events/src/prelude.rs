//! Prelude module - commonly used types for convenient import.
//!
//! Use `use tickbus_events::prelude::*;` to import all essential types.
//!
//! # Example
//!
//! ```rust
//! use tickbus_events::prelude::*;
//!
//! define_event!(Shutdown => ());
//!
//! let bus = EventBus::new();
//! bus.register::<Shutdown>(ListenerId::generate(), |()| {}).unwrap();
//! assert_eq!(bus.broadcast_sync::<Shutdown>(()).unwrap(), 1);
//! ```

// Bus
pub use crate::{BusOptions, DEFAULT_DRAIN_BUDGET, DrainReport, EventBus};

// Errors
pub use crate::{BusError, BusResult};

// Event types
pub use crate::{Callback, Event, EventKey, ListenerId, RegistrationToken};

pub use crate::define_event;
