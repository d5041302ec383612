//! Execution layer - plan aggregation, tick selection, and the control loop.
//!
//! A [`Plan`] orders [`Phase`]s, a phase orders steps, and each level is
//! governed by its own strategy. [`PlanScheduler`] walks the tree once per
//! tick, threading claimed assets through every strategy call, and
//! [`ExecutionEngine`] hands the selected steps to a [`StepDriver`].

#![warn(missing_docs)]

pub mod control;
pub mod definition;
pub mod driver;
pub mod engine;
pub mod error;
pub mod phase;
pub mod plan;
pub mod scheduler;

pub use control::PlanControl;
pub use definition::{PhaseDefinition, PlanDefinition, StepDefinition};
pub use driver::{SimulatedDriver, StepDriver};
pub use engine::{
    EngineConfig, ExecutionEngine, RunOutcome, TickHook, TickReport, TickResult,
};
pub use error::{PlanError, Result};
pub use phase::{aggregate_status, Phase};
pub use plan::Plan;
pub use scheduler::{PlanScheduler, SchedulerConfig, SelectedStep, Selection};
