//! Serial strategy - one element at a time, in declaration order.

use cadence_core::{DirtyAssets, Element};
use tracing::debug;

use crate::{is_eligible, InterruptFlag, Strategy};

/// Selects at most one element: the first one that has not completed,
/// provided it is eligible.
///
/// Element `i + 1` is never offered while element `i` is incomplete, even if
/// element `i` is in flight, waiting, or blocked by a dirty asset.
#[derive(Debug, Default)]
pub struct SerialStrategy {
    interrupted: InterruptFlag,
}

impl SerialStrategy {
    /// Create a running serial strategy.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Element> Strategy<T> for SerialStrategy {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn candidates<'a>(&self, elements: &'a [T], dirty_assets: &DirtyAssets) -> Vec<&'a T> {
        if self.interrupted.is_set() {
            return Vec::new();
        }

        elements
            .iter()
            .find(|e| !e.is_complete())
            .filter(|e| is_eligible(*e, dirty_assets))
            .into_iter()
            .collect()
    }

    fn interrupt(&self) {
        debug!("Interrupting serial strategy");
        self.interrupted.set();
    }

    fn proceed(&self) {
        debug!("Proceeding serial strategy");
        self.interrupted.clear();
    }

    fn is_interrupted(&self) -> bool {
        self.interrupted.is_set()
    }
}
