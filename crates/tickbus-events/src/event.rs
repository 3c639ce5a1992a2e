//! Event type descriptors and the keys derived from them.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

/// A category of event together with the shape of its arguments.
///
/// Implementors are usually zero-sized marker types declared with
/// [`define_event!`](crate::define_event). Multi-argument events use a tuple
/// for `Args`; events without arguments use `()`.
///
/// ```rust
/// use tickbus_events::Event;
///
/// struct IntPair;
///
/// impl Event for IntPair {
///     type Args = (i32, f64);
/// }
///
/// assert!(IntPair::name().ends_with("IntPair"));
/// ```
pub trait Event: 'static {
    /// Arguments delivered to every listener of this event.
    type Args: Send + Sync + 'static;

    /// Human-readable name used in diagnostics.
    #[must_use]
    fn name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Callback invoked with the arguments of an event of type `A`.
pub type Callback<A> = Arc<dyn Fn(&A) + Send + Sync>;

/// Stable identity of an event type, used as the outer handler-table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventKey {
    id: TypeId,
    name: &'static str,
}

impl EventKey {
    /// Key for the event type `E`.
    #[must_use]
    pub fn of<E: Event>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: E::name(),
        }
    }

    /// Name of the event type this key was derived from.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Handle returned by a successful registration.
///
/// It identifies the event type only, so one token may be reused to
/// unregister any listener of that type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationToken {
    key: EventKey,
}

impl RegistrationToken {
    pub(crate) fn new(key: EventKey) -> Self {
        Self { key }
    }

    /// Event type this token was issued for.
    #[must_use]
    pub fn event_key(&self) -> EventKey {
        self.key
    }
}

/// Declare a zero-sized event type and its argument shape.
///
/// ```rust
/// tickbus_events::define_event! {
///     /// Fired with a score and a multiplier.
///     pub ScoreChanged => (u32, f32)
/// }
///
/// tickbus_events::define_event!(pub Shutdown => ());
/// ```
#[macro_export]
macro_rules! define_event {
    ($(#[$meta:meta])* $vis:vis $name:ident => $args:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        $vis struct $name;

        impl $crate::Event for $name {
            type Args = $args;

            fn name() -> &'static str {
                stringify!($name)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::define_event!(IntPair => (i32, f64));
    crate::define_event!(Label => String);

    struct Undeclared;

    impl Event for Undeclared {
        type Args = ();
    }

    #[test]
    fn test_keys_distinguish_event_types() {
        assert_eq!(EventKey::of::<IntPair>(), EventKey::of::<IntPair>());
        assert_ne!(EventKey::of::<IntPair>(), EventKey::of::<Label>());
    }

    #[test]
    fn test_declared_event_name() {
        assert_eq!(IntPair::name(), "IntPair");
        assert_eq!(EventKey::of::<Label>().to_string(), "Label");
    }

    #[test]
    fn test_default_name_is_type_path() {
        assert!(Undeclared::name().ends_with("Undeclared"));
    }

    #[test]
    fn test_token_carries_key() {
        let token = RegistrationToken::new(EventKey::of::<IntPair>());
        assert_eq!(token.event_key(), EventKey::of::<IntPair>());
        assert_eq!(token.event_key().name(), "IntPair");
    }
}
