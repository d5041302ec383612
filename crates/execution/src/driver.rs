//! Execution collaborator interface.

use std::collections::HashSet;

use async_trait::async_trait;
use cadence_core::{Status, Step};
use tracing::{debug, warn};

/// Performs the real work behind steps.
///
/// The driver is the only component that changes a step's status.
#[async_trait]
pub trait StepDriver: Send + Sync {
    /// Hand a selected step to execution.
    async fn dispatch(&mut self, step: &mut Step) -> anyhow::Result<()>;

    /// Advance a step that is in flight.
    async fn poll(&mut self, step: &mut Step) -> anyhow::Result<()>;
}

/// Driver that completes every step after a fixed number of polls.
///
/// Dispatch moves a step to `Starting`; the first poll moves it to
/// `InProgress` (or `Error` for steps configured to fail) and the second
/// poll completes it.
#[derive(Debug, Default)]
pub struct SimulatedDriver {
    failures: HashSet<String>,
    dispatched: usize,
}

impl SimulatedDriver {
    /// Create a driver where every step succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the named step the next time it starts.
    pub fn with_failure(mut self, step: impl Into<String>) -> Self {
        self.failures.insert(step.into());
        self
    }

    /// Total dispatches so far.
    pub fn dispatched(&self) -> usize {
        self.dispatched
    }
}

#[async_trait]
impl StepDriver for SimulatedDriver {
    async fn dispatch(&mut self, step: &mut Step) -> anyhow::Result<()> {
        if step.status() == Status::Pending {
            step.transition(Status::Prepared)?;
        }
        step.transition(Status::Starting)?;
        self.dispatched += 1;
        debug!("Dispatched step {}", step.name);
        Ok(())
    }

    async fn poll(&mut self, step: &mut Step) -> anyhow::Result<()> {
        match step.status() {
            Status::Starting if self.failures.remove(&step.name) => {
                warn!("Step {} failed", step.name);
                step.transition(Status::Error)?;
            }
            Status::Starting => step.transition(Status::InProgress)?,
            Status::InProgress => step.transition(Status::Complete)?,
            _ => {}
        }
        Ok(())
    }
}
