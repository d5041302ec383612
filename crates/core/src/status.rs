//! Step status and its state machine.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a step.
///
/// The happy path is `Pending -> Prepared -> Starting -> InProgress -> Complete`.
/// `Waiting` and `Error` are reachable from any non-terminal status and are
/// resolved by going back to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Not yet handed to execution
    Pending,
    /// Accepted for execution, not launched yet
    Prepared,
    /// Launch requested
    Starting,
    /// Work is running
    InProgress,
    /// Held back until something external changes
    Waiting,
    /// Execution failed
    Error,
    /// Finished successfully
    Complete,
}

impl Status {
    /// Whether a strategy may consider this status for dispatch.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending | Self::Prepared)
    }

    /// Terminal success.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Work the execution collaborator is currently performing.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Starting | Self::InProgress)
    }

    /// Waiting or Error.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Waiting | Self::Error)
    }

    /// Check whether moving to `next` is a legal edge.
    ///
    /// Staying in the same status is always allowed.
    pub fn can_transition_to(&self, next: Status) -> bool {
        if *self == next {
            return true;
        }

        match (self, next) {
            (Self::Complete, _) => false,
            (_, Self::Waiting | Self::Error) => true,
            (Self::Pending, Self::Prepared) => true,
            (Self::Prepared, Self::Starting) => true,
            (Self::Starting, Self::InProgress) => true,
            (Self::InProgress, Self::Complete) => true,
            (Self::Waiting | Self::Error, Self::Pending) => true,
            _ => false,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Prepared => "PREPARED",
            Self::Starting => "STARTING",
            Self::InProgress => "IN_PROGRESS",
            Self::Waiting => "WAITING",
            Self::Error => "ERROR",
            Self::Complete => "COMPLETE",
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::Pending
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
