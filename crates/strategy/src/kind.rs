//! Strategy selection by name.

use std::str::FromStr;
use std::sync::Arc;

use cadence_core::Element;
use serde::{Deserialize, Serialize};

use crate::{
    CanaryStrategy, DependencyStrategy, ParallelStrategy, SerialStrategy, Strategy,
    StrategyError,
};

/// Built-in strategy policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// One element at a time
    Serial,
    /// Every eligible element at once
    Parallel,
    /// Gated by declared prerequisites
    Dependency,
    /// Canaries, then serial
    SerialCanary,
    /// Canaries, then parallel
    ParallelCanary,
}

impl StrategyKind {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Serial => "serial",
            Self::Parallel => "parallel",
            Self::Dependency => "dependency",
            Self::SerialCanary => "serial-canary",
            Self::ParallelCanary => "parallel-canary",
        }
    }

    /// Build a fresh strategy instance of this kind.
    pub fn build<T: Element + 'static>(&self) -> Arc<dyn Strategy<T>> {
        match self {
            Self::Serial => Arc::new(SerialStrategy::new()),
            Self::Parallel => Arc::new(ParallelStrategy::new()),
            Self::Dependency => Arc::new(DependencyStrategy::new()),
            Self::SerialCanary => {
                Arc::new(CanaryStrategy::with_default_count(SerialStrategy::new()))
            }
            Self::ParallelCanary => {
                Arc::new(CanaryStrategy::with_default_count(ParallelStrategy::new()))
            }
        }
    }
}

impl Default for StrategyKind {
    fn default() -> Self {
        Self::Serial
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serial" => Ok(Self::Serial),
            "parallel" => Ok(Self::Parallel),
            "dependency" => Ok(Self::Dependency),
            "serial-canary" => Ok(Self::SerialCanary),
            "parallel-canary" => Ok(Self::ParallelCanary),
            _ => Err(StrategyError::UnknownStrategy(s.to_string())),
        }
    }
}
