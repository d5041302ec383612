//! Step model - the smallest schedulable unit of work.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::id::StepId;
use crate::{Element, Status, Time};

/// A step is one unit of deployment or recovery work, e.g. launching a
/// single replica.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Unique identifier
    pub id: StepId,

    /// Step name, unique within its phase
    pub name: String,

    /// Shared resource this step mutates
    pub asset: Option<String>,

    /// Names of sibling steps that must complete first
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Current status
    status: Status,

    /// Last status change
    pub updated_at: Option<Time>,
}

impl Step {
    /// Create a pending step.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: StepId::new(),
            name: name.into(),
            asset: None,
            dependencies: Vec::new(),
            status: Status::Pending,
            updated_at: None,
        }
    }

    /// Set the asset.
    pub fn with_asset(mut self, asset: impl Into<String>) -> Self {
        self.asset = Some(asset.into());
        self
    }

    /// Add a prerequisite sibling.
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(name.into());
        self
    }

    /// Start from a known status, e.g. one restored by the caller.
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Current status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Move to `next`, rejecting edges the state machine does not allow.
    pub fn transition(&mut self, next: Status) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                step: self.name.clone(),
                from: self.status,
                to: next,
            });
        }

        if self.status != next {
            self.status = next;
            self.updated_at = Some(chrono::Utc::now());
        }
        Ok(())
    }

    /// Resolve a Waiting or Error step back to Pending.
    pub fn restart(&mut self) -> Result<()> {
        self.transition(Status::Pending)
    }
}

impl Element for Step {
    fn name(&self) -> &str {
        &self.name
    }

    fn asset(&self) -> Option<&str> {
        self.asset.as_deref()
    }

    fn is_pending(&self) -> bool {
        self.status.is_pending()
    }

    fn is_complete(&self) -> bool {
        self.status.is_complete()
    }

    fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}
