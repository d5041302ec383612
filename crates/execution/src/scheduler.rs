//! Tick selection across the plan tree.

use cadence_core::{DirtyAssets, Element, StepId};
use tracing::debug;

use crate::Plan;

/// Configuration for candidate selection.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Seed each tick's dirty set with the assets of in-flight steps
    pub claim_in_flight_assets: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            claim_in_flight_assets: true,
        }
    }
}

impl SchedulerConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether in-flight steps claim their assets.
    pub fn with_claim_in_flight_assets(mut self, claim: bool) -> Self {
        self.claim_in_flight_assets = claim;
        self
    }
}

/// A step chosen for dispatch this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedStep {
    /// Owning plan
    pub plan: String,
    /// Owning phase
    pub phase: String,
    /// Step name
    pub step: String,
    /// Step id
    pub id: StepId,
}

/// Outcome of one tick's candidate selection.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Steps to dispatch, in selection order
    pub selected: Vec<SelectedStep>,
    /// Candidates that lost their asset to an earlier candidate this tick
    pub deferred: Vec<String>,
    /// Assets claimed by the end of the tick
    pub dirty_assets: DirtyAssets,
}

impl Selection {
    /// Whether nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Names of the selected steps.
    pub fn step_names(&self) -> Vec<&str> {
        self.selected.iter().map(|s| s.step.as_str()).collect()
    }
}

/// Walks plans root to leaf, asking each strategy for candidates and
/// threading the claimed assets through every call of the tick.
#[derive(Debug, Clone, Default)]
pub struct PlanScheduler {
    config: SchedulerConfig,
}

impl PlanScheduler {
    /// Create a new scheduler.
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// Select this tick's steps across `plans`, earlier plans first.
    pub fn select(&self, plans: &[Plan]) -> Selection {
        self.select_with(plans, DirtyAssets::new())
    }

    /// Select this tick's steps, starting from assets the caller has
    /// already claimed.
    pub fn select_with(&self, plans: &[Plan], mut dirty: DirtyAssets) -> Selection {
        if self.config.claim_in_flight_assets {
            dirty.extend(plans.iter().flat_map(Plan::in_flight_assets));
        }

        let mut selection = Selection::default();

        for plan in plans {
            let phases = plan.strategy().candidates(plan.phases(), &dirty);
            debug!("Plan {} offered {} phase(s)", plan.name, phases.len());

            for phase in phases {
                for step in phase.candidates(&dirty) {
                    if let Some(asset) = step.asset() {
                        // Siblings may both be offered for the same asset;
                        // the first one dispatched this tick wins.
                        if !dirty.claim(asset) {
                            debug!(
                                "Deferring {} in {}: asset {} already claimed",
                                step.name, phase.name, asset
                            );
                            selection.deferred.push(step.name.clone());
                            continue;
                        }
                    }

                    selection.selected.push(SelectedStep {
                        plan: plan.name.clone(),
                        phase: phase.name.clone(),
                        step: step.name.clone(),
                        id: step.id,
                    });
                }
            }
        }

        selection.dirty_assets = dirty;
        selection
    }
}
