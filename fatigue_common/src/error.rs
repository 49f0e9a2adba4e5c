//! Error types for the fatigue-analysis engine.

use thiserror::Error;

/// Errors that can occur during engine configuration or counting.
///
/// A context latches the first error it encounters and refuses further
/// work until it is re-initialized.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// An argument was out of range or inconsistent
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong
        reason: String,
    },

    /// A recognized but unimplemented configuration was requested
    #[error("unsupported: {what}")]
    Unsupported {
        /// The rejected configuration
        what: String,
    },

    /// A buffer could not be grown (capacity-locked or exhausted)
    #[error("memory: {reason}")]
    Memory {
        /// Why the allocation was refused
        reason: String,
    },

    /// Amplitude transformation failed
    #[error("amplitude transform: {reason}")]
    AmplitudeTransform {
        /// Failure detail
        reason: String,
    },

    /// Turning-point store access failed
    #[error("turning points: {reason}")]
    TurningPoint {
        /// Failure detail
        reason: String,
    },

    /// Damage look-up table missing or stale
    #[error("damage LUT: {reason}")]
    Lut {
        /// Failure detail
        reason: String,
    },

    /// A histogram bin would exceed the saturation limit
    #[error("count overflow in {histogram} at index {index}")]
    Overflow {
        /// Which histogram would have wrapped
        histogram: &'static str,
        /// Offending bin index
        index: usize,
    },

    /// Operation not permitted in the current context state
    #[error("operation {operation} not permitted in state {state}")]
    State {
        /// The attempted operation
        operation: &'static str,
        /// The context state it was attempted in
        state: &'static str,
    },
}

impl EngineError {
    /// Shorthand for an invalid-argument error.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Shorthand for an unsupported-configuration error.
    pub fn unsupported(what: impl Into<String>) -> Self {
        Self::Unsupported { what: what.into() }
    }
}
