//! Strategy error types.

/// Errors raised while building or validating strategies.
///
/// Candidate selection itself never fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StrategyError {
    /// Strategy name not recognised
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    /// A prerequisite that names no sibling element
    #[error("Element {element} depends on unknown element {dependency}")]
    UnknownDependency {
        /// Dependent element
        element: String,
        /// Missing prerequisite
        dependency: String,
    },

    /// Prerequisites form a cycle
    #[error("Circular dependency: {}", chain.join(" -> "))]
    CircularDependency {
        /// Elements on the cycle, first element repeated at the end
        chain: Vec<String>,
    },

    /// Canary strategies need at least one canary
    #[error("Canary count must be at least 1")]
    InvalidCanaryCount,
}

/// Result alias for strategy operations.
pub type Result<T> = std::result::Result<T, StrategyError>;
