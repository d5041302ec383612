//! Plan construction errors.

use cadence_strategy::StrategyError;

/// Error type for plan construction and loading.
pub type Result<T> = std::result::Result<T, PlanError>;

/// Errors that can occur while building a plan.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// Two siblings share a name
    #[error("Duplicate {kind} name in {parent}: {name}")]
    DuplicateName {
        /// "phase" or "step"
        kind: &'static str,
        /// Enclosing plan or phase
        parent: String,
        /// Repeated name
        name: String,
    },

    /// Invalid strategy or prerequisites
    #[error("Strategy error in {parent}: {source}")]
    Strategy {
        /// Plan or phase the error belongs to
        parent: String,
        /// Underlying error
        #[source]
        source: StrategyError,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
