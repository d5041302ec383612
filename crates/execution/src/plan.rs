//! Plan - the root of a strategy-governed tree of phases.

use std::sync::Arc;

use cadence_core::{DirtyAssets, Element, Status, Step, StepId};
use cadence_strategy::Strategy;

use crate::phase::aggregate_status;
use crate::{Phase, PlanControl};

/// A plan orders phases under its own strategy, e.g. a deployment or a
/// recovery plan.
pub struct Plan {
    /// Plan name
    pub name: String,

    phases: Vec<Phase>,

    strategy: Arc<dyn Strategy<Phase>>,
}

impl Plan {
    /// Create an empty plan.
    pub fn new(name: impl Into<String>, strategy: Arc<dyn Strategy<Phase>>) -> Self {
        Self {
            name: name.into(),
            phases: Vec::new(),
            strategy,
        }
    }

    /// Append a phase.
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phases.push(phase);
        self
    }

    /// Phases in declaration order.
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Mutable phases, for the execution collaborator.
    pub fn phases_mut(&mut self) -> &mut [Phase] {
        &mut self.phases
    }

    /// Look up a phase by name.
    pub fn phase(&self, name: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.name == name)
    }

    /// The strategy ordering this plan's phases.
    pub fn strategy(&self) -> &Arc<dyn Strategy<Phase>> {
        &self.strategy
    }

    /// Every step of every phase, in declaration order.
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.phases.iter().flat_map(|p| p.steps().iter())
    }

    /// Look up a step by phase and step name.
    pub fn step(&self, phase: &str, step: &str) -> Option<&Step> {
        self.phase(phase).and_then(|p| p.step(step))
    }

    /// Look up a step by id.
    pub fn step_mut(&mut self, id: StepId) -> Option<&mut Step> {
        self.phases
            .iter_mut()
            .find_map(|p| p.step_by_id_mut(id))
    }

    /// Assets held by steps that are currently in flight.
    pub fn in_flight_assets(&self) -> impl Iterator<Item = &str> {
        self.steps()
            .filter(|s| s.status().is_in_flight())
            .filter_map(|s| Element::asset(s))
    }

    /// Whether any step is in flight.
    pub fn has_in_flight(&self) -> bool {
        self.steps().any(|s| s.status().is_in_flight())
    }

    /// Aggregate status of the plan's phases.
    pub fn status(&self) -> Status {
        aggregate_status(self.phases.iter().map(Phase::status), self.strategy.is_interrupted())
    }

    /// Whether every phase is complete.
    pub fn is_complete(&self) -> bool {
        self.phases.iter().all(|p| p.is_complete())
    }

    /// Pause phase selection. Phases already running keep their own state.
    pub fn interrupt(&self) {
        self.strategy.interrupt();
    }

    /// Resume phase selection.
    pub fn proceed(&self) {
        self.strategy.proceed();
    }

    /// Whether phase selection is paused.
    pub fn is_interrupted(&self) -> bool {
        self.strategy.is_interrupted()
    }

    /// Whether the plan or any of its phases is paused.
    pub fn has_interruption(&self) -> bool {
        self.is_interrupted() || self.phases.iter().any(Phase::is_interrupted)
    }

    /// Pause the plan and every phase.
    pub fn interrupt_all(&self) {
        self.interrupt();
        self.phases.iter().for_each(Phase::interrupt);
    }

    /// Resume the plan and every phase. Approval gates stay as they are.
    pub fn proceed_all(&self) {
        self.proceed();
        self.phases.iter().for_each(Phase::proceed);
    }

    /// Whether a phase the plan would schedule now is held until an
    /// operator approves more of its steps.
    pub fn awaiting_approval(&self) -> bool {
        self.strategy
            .candidates(&self.phases, &DirtyAssets::new())
            .into_iter()
            .any(Phase::awaiting_approval)
    }

    /// A handle for pausing and resuming this plan from another thread.
    pub fn control(&self) -> PlanControl {
        PlanControl::new(
            self.name.clone(),
            Arc::clone(&self.strategy),
            self.phases
                .iter()
                .map(|p| (p.name.clone(), Arc::clone(p.strategy())))
                .collect(),
        )
    }
}

impl std::fmt::Debug for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plan")
            .field("name", &self.name)
            .field("strategy", &self.strategy.name())
            .field("phases", &self.phases)
            .finish()
    }
}
