//! Phase - a strategy-governed group of steps.

use std::sync::Arc;

use cadence_core::{Element, PhaseId, Status, Step, StepId};
use cadence_strategy::Strategy;

/// A phase groups steps under one strategy.
///
/// A phase is itself an [`Element`], so a plan schedules phases with the
/// same strategies a phase uses for its steps.
pub struct Phase {
    /// Unique identifier
    pub id: PhaseId,

    /// Phase name, unique within its plan
    pub name: String,

    /// Names of sibling phases that must complete first
    pub dependencies: Vec<String>,

    steps: Vec<Step>,

    strategy: Arc<dyn Strategy<Step>>,
}

impl Phase {
    /// Create an empty phase.
    pub fn new(name: impl Into<String>, strategy: Arc<dyn Strategy<Step>>) -> Self {
        Self {
            id: PhaseId::new(),
            name: name.into(),
            dependencies: Vec::new(),
            steps: Vec::new(),
            strategy,
        }
    }

    /// Append a step.
    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Add a prerequisite phase.
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(name.into());
        self
    }

    /// Steps in declaration order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Mutable steps, for the execution collaborator.
    pub fn steps_mut(&mut self) -> &mut [Step] {
        &mut self.steps
    }

    /// Look up a step by name.
    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Look up a step by id.
    pub fn step_by_id_mut(&mut self, id: StepId) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.id == id)
    }

    /// The strategy governing this phase.
    pub fn strategy(&self) -> &Arc<dyn Strategy<Step>> {
        &self.strategy
    }

    /// Steps the strategy offers this tick.
    pub fn candidates(&self, dirty_assets: &cadence_core::DirtyAssets) -> Vec<&Step> {
        self.strategy.candidates(&self.steps, dirty_assets)
    }

    /// Pause this phase.
    pub fn interrupt(&self) {
        self.strategy.interrupt();
    }

    /// Resume this phase.
    pub fn proceed(&self) {
        self.strategy.proceed();
    }

    /// Whether this phase is paused.
    pub fn is_interrupted(&self) -> bool {
        self.strategy.is_interrupted()
    }

    /// Approve the next step held behind the strategy's approval gate.
    /// Returns false if the strategy has no gate left to open.
    pub fn approve(&self) -> bool {
        self.strategy.approve()
    }

    /// Whether the phase is held until an operator approves more steps.
    pub fn awaiting_approval(&self) -> bool {
        self.strategy.awaiting_approval(&self.steps)
    }

    /// Aggregate status of the phase's steps. A paused phase, or one
    /// awaiting approval, reports Waiting.
    pub fn status(&self) -> Status {
        let held = self.is_interrupted() || self.awaiting_approval();
        aggregate_status(self.steps.iter().map(Step::status), held)
    }
}

impl std::fmt::Debug for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Phase")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("strategy", &self.strategy.name())
            .field("steps", &self.steps)
            .finish()
    }
}

impl Element for Phase {
    fn name(&self) -> &str {
        &self.name
    }

    fn asset(&self) -> Option<&str> {
        None
    }

    fn is_pending(&self) -> bool {
        self.steps.iter().any(|s| s.is_pending())
    }

    fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| s.is_complete())
    }

    fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}

/// Fold child statuses into the status of their group.
///
/// An empty group is complete. Errors win over everything but completion;
/// a paused or waiting group reports `Waiting`; any started or finished
/// work makes the group `InProgress`.
pub fn aggregate_status<I>(children: I, interrupted: bool) -> Status
where
    I: IntoIterator<Item = Status>,
{
    let children: Vec<Status> = children.into_iter().collect();

    if children.iter().all(Status::is_complete) {
        return Status::Complete;
    }
    if children.contains(&Status::Error) {
        return Status::Error;
    }
    if interrupted || children.contains(&Status::Waiting) {
        return Status::Waiting;
    }
    if children.iter().any(|s| s.is_in_flight() || s.is_complete()) {
        return Status::InProgress;
    }
    if children.contains(&Status::Prepared) {
        return Status::Prepared;
    }
    Status::Pending
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::DirtyAssets;
    use cadence_strategy::{CanaryStrategy, ParallelStrategy, SerialStrategy};

    fn phase(statuses: &[Status]) -> Phase {
        statuses.iter().enumerate().fold(
            Phase::new("nodes", Arc::new(ParallelStrategy::new())),
            |phase, (i, status)| {
                phase.with_step(Step::new(format!("node-{i}")).with_status(*status))
            },
        )
    }

    #[test]
    fn test_empty_phase_is_complete() {
        let phase = phase(&[]);
        assert!(phase.is_complete());
        assert!(!phase.is_pending());
        assert_eq!(phase.status(), Status::Complete);
    }

    #[test]
    fn test_aggregate_status() {
        assert_eq!(phase(&[Status::Pending, Status::Pending]).status(), Status::Pending);
        assert_eq!(phase(&[Status::Prepared, Status::Pending]).status(), Status::Prepared);
        assert_eq!(phase(&[Status::Complete, Status::Pending]).status(), Status::InProgress);
        assert_eq!(phase(&[Status::Starting, Status::Pending]).status(), Status::InProgress);
        assert_eq!(phase(&[Status::Waiting, Status::InProgress]).status(), Status::Waiting);
        assert_eq!(phase(&[Status::Error, Status::Waiting]).status(), Status::Error);
        assert_eq!(phase(&[Status::Complete, Status::Complete]).status(), Status::Complete);
    }

    #[test]
    fn test_interrupted_phase_reports_waiting() {
        let phase = phase(&[Status::Pending]);
        phase.interrupt();
        assert_eq!(phase.status(), Status::Waiting);
        assert!(phase.candidates(&DirtyAssets::new()).is_empty());
        phase.proceed();
        assert_eq!(phase.status(), Status::Pending);
    }

    #[test]
    fn test_canary_phase_waits_for_approval() {
        let canary = CanaryStrategy::new(ParallelStrategy::new(), 1).unwrap();
        let phase = Phase::new("nodes", Arc::new(canary))
            .with_step(Step::new("node-0"))
            .with_step(Step::new("node-1"));

        assert!(phase.awaiting_approval());
        assert_eq!(phase.status(), Status::Waiting);

        phase.interrupt();
        phase.proceed();
        assert!(phase.candidates(&DirtyAssets::new()).is_empty());

        assert!(phase.approve());
        assert!(!phase.awaiting_approval());
        assert_eq!(phase.status(), Status::Pending);
        assert_eq!(phase.candidates(&DirtyAssets::new()).len(), 1);
    }

    #[test]
    fn test_ungated_phase_ignores_approval() {
        let phase = phase(&[Status::Pending]);
        assert!(!phase.approve());
        assert!(!phase.awaiting_approval());
    }

    #[test]
    fn test_phase_pending_while_any_step_pending() {
        let phase = phase(&[Status::InProgress, Status::Pending]);
        assert!(phase.is_pending());
        assert!(!phase.is_complete());

        let phase = self::phase(&[Status::InProgress, Status::Error]);
        assert!(!phase.is_pending());
        assert!(!phase.is_complete());
    }

    #[test]
    fn test_phase_has_no_asset() {
        let phase = Phase::new("p", Arc::new(SerialStrategy::new()))
            .with_step(Step::new("a").with_asset("node-0"));
        assert_eq!(Element::asset(&phase), None);
    }
}
