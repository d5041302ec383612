//! Core error types.

use crate::Status;

/// Errors raised by the core data model.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A status change that the step state machine does not allow
    #[error("Invalid transition for step {step}: {from} -> {to}")]
    InvalidTransition {
        /// Step name
        step: String,
        /// Current status
        from: Status,
        /// Requested status
        to: Status,
    },
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
