//! Event bus error types.

use thiserror::Error;

/// Errors returned by [`EventBus`](crate::EventBus) operations.
///
/// Duplicate registrations and unknown listeners are not errors; they are
/// reported through the `Ok` value of the respective operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// The bus was used before `init` or after `destroy`.
    #[error("event bus is not initialized")]
    NotInitialized,

    /// A stored callback does not match the argument shape of its event type.
    #[error("callback stored for event {event} does not match its argument type")]
    CallbackMismatch {
        /// Name of the event type whose handler was inconsistent.
        event: &'static str,
    },
}

/// Result type for event bus operations.
pub type BusResult<T> = Result<T, BusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            BusError::NotInitialized.to_string(),
            "event bus is not initialized"
        );

        let err = BusError::CallbackMismatch { event: "IntPair" };
        assert_eq!(
            err.to_string(),
            "callback stored for event IntPair does not match its argument type"
        );
    }
}
