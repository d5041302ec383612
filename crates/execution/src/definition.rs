//! Serializable plan definitions.
//!
//! Plans are described in JSON:
//!
//! ```json
//! {
//!   "name": "deploy",
//!   "strategy": "serial",
//!   "phases": [
//!     {
//!       "name": "nodes",
//!       "strategy": "parallel",
//!       "steps": [
//!         { "name": "node-0", "asset": "node-0" },
//!         { "name": "node-1", "asset": "node-1" }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use cadence_core::{Status, Step};
use cadence_strategy::{DependencyStrategy, StrategyKind};
use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};
use crate::{Phase, Plan};

/// Definition of a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDefinition {
    /// Plan name
    pub name: String,

    /// Strategy ordering the phases
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Phases in declaration order
    pub phases: Vec<PhaseDefinition>,
}

/// Definition of a phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseDefinition {
    /// Phase name
    pub name: String,

    /// Strategy ordering the steps
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Prerequisite phases
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Steps in declaration order
    pub steps: Vec<StepDefinition>,
}

/// Definition of a step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Step name
    pub name: String,

    /// Shared resource the step mutates
    #[serde(default)]
    pub asset: Option<String>,

    /// Prerequisite steps within the phase
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Starting status, for plans resumed mid-flight
    #[serde(default)]
    pub status: Status,
}

impl PlanDefinition {
    /// Parse a definition from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a definition from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Number of steps across all phases.
    pub fn step_count(&self) -> usize {
        self.phases.iter().map(|p| p.steps.len()).sum()
    }

    /// Build the plan, rejecting duplicate names, unknown prerequisites and
    /// prerequisite cycles.
    pub fn build(&self) -> Result<Plan> {
        check_unique("phase", &self.name, self.phases.iter().map(|p| p.name.as_str()))?;

        let mut plan = Plan::new(self.name.clone(), self.strategy.build::<Phase>());
        for phase in &self.phases {
            plan = plan.with_phase(phase.build()?);
        }

        DependencyStrategy::validate(plan.phases()).map_err(|source| PlanError::Strategy {
            parent: self.name.clone(),
            source,
        })?;

        Ok(plan)
    }
}

impl PhaseDefinition {
    fn build(&self) -> Result<Phase> {
        check_unique("step", &self.name, self.steps.iter().map(|s| s.name.as_str()))?;

        let mut phase = Phase::new(self.name.clone(), self.strategy.build::<Step>());
        phase.dependencies = self.dependencies.clone();

        for def in &self.steps {
            let mut step = Step::new(def.name.clone()).with_status(def.status);
            step.asset = def.asset.clone();
            step.dependencies = def.dependencies.clone();
            phase = phase.with_step(step);
        }

        DependencyStrategy::validate(phase.steps()).map_err(|source| PlanError::Strategy {
            parent: self.name.clone(),
            source,
        })?;

        Ok(phase)
    }
}

fn check_unique<'a>(
    kind: &'static str,
    parent: &str,
    names: impl Iterator<Item = &'a str>,
) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(PlanError::DuplicateName {
                kind,
                parent: parent.to_string(),
                name: name.to_string(),
            });
        }
    }
    Ok(())
}
