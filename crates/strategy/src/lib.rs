//! Candidate-selection strategies.
//!
//! A [`Strategy`] decides, once per tick, which elements of a group may be
//! dispatched next. It is a pure function of the elements' reported state,
//! the assets already claimed this tick, and its own interrupt flag.

#![warn(missing_docs)]

pub mod canary;
pub mod dependency;
pub mod error;
pub mod interrupt;
pub mod kind;
pub mod parallel;
pub mod serial;
pub mod strategy;

pub use canary::{CanaryStrategy, DEFAULT_CANARY_COUNT};
pub use dependency::{DependencyStrategy, Resolution};
pub use error::{Result, StrategyError};
pub use interrupt::InterruptFlag;
pub use kind::StrategyKind;
pub use parallel::ParallelStrategy;
pub use serial::SerialStrategy;
pub use strategy::{is_eligible, Strategy};
