//! Operator-facing pause/resume handle.

use std::sync::Arc;

use cadence_core::Step;
use cadence_strategy::Strategy;
use tracing::info;

use crate::Phase;

/// Cloneable handle onto the strategies of one plan.
///
/// The handle shares the plan's strategy instances, so it can pause or
/// resume the plan from another thread while the engine keeps ticking.
/// Changes take effect on the next candidate computation.
#[derive(Clone)]
pub struct PlanControl {
    plan: String,
    strategy: Arc<dyn Strategy<Phase>>,
    phases: Vec<(String, Arc<dyn Strategy<Step>>)>,
}

impl PlanControl {
    pub(crate) fn new(
        plan: String,
        strategy: Arc<dyn Strategy<Phase>>,
        phases: Vec<(String, Arc<dyn Strategy<Step>>)>,
    ) -> Self {
        Self { plan, strategy, phases }
    }

    /// Name of the controlled plan.
    pub fn plan(&self) -> &str {
        &self.plan
    }

    /// Pause phase selection of the plan.
    pub fn interrupt(&self) {
        info!("Interrupting plan {}", self.plan);
        self.strategy.interrupt();
    }

    /// Resume phase selection of the plan.
    pub fn proceed(&self) {
        info!("Proceeding plan {}", self.plan);
        self.strategy.proceed();
    }

    /// Pause the plan and every phase.
    pub fn interrupt_all(&self) {
        self.interrupt();
        self.phases.iter().for_each(|(_, s)| s.interrupt());
    }

    /// Resume the plan and every phase. Approval gates stay as they are.
    pub fn proceed_all(&self) {
        self.proceed();
        self.phases.iter().for_each(|(_, s)| s.proceed());
    }

    /// Pause a single phase. Returns false if no phase has that name.
    pub fn interrupt_phase(&self, name: &str) -> bool {
        self.phase_strategy(name)
            .map(|s| {
                info!("Interrupting phase {} of plan {}", name, self.plan);
                s.interrupt();
            })
            .is_some()
    }

    /// Resume a single phase. Returns false if no phase has that name.
    pub fn proceed_phase(&self, name: &str) -> bool {
        self.phase_strategy(name)
            .map(|s| {
                info!("Proceeding phase {} of plan {}", name, self.plan);
                s.proceed();
            })
            .is_some()
    }

    /// Approve the next gated step of a phase. Returns false if no phase has
    /// that name or its strategy has no gate left to open.
    pub fn approve_phase(&self, name: &str) -> bool {
        let approved = self.phase_strategy(name).is_some_and(|s| s.approve());
        if approved {
            info!("Approved next step of phase {} in plan {}", name, self.plan);
        }
        approved
    }

    /// Whether phase selection of the plan is paused.
    pub fn is_interrupted(&self) -> bool {
        self.strategy.is_interrupted()
    }

    fn phase_strategy(&self, name: &str) -> Option<&Arc<dyn Strategy<Step>>> {
        self.phases.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }
}

impl std::fmt::Debug for PlanControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanControl")
            .field("plan", &self.plan)
            .field("interrupted", &self.is_interrupted())
            .finish()
    }
}
