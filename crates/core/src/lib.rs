//! Cadence core data models.
//!
//! This crate defines the schedulable building blocks shared by every
//! strategy and by the plan aggregators: steps, their status state machine,
//! the [`Element`] capability set and the per-tick [`DirtyAssets`] set.

#![warn(missing_docs)]

mod asset;
mod element;
mod error;
mod id;
mod status;
mod step;

pub use asset::DirtyAssets;
pub use element::Element;
pub use error::{CoreError, Result};
pub use id::{PhaseId, StepId};
pub use status::Status;
pub use step::Step;

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
