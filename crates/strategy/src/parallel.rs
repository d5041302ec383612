//! Parallel strategy - every eligible element at once.

use cadence_core::{DirtyAssets, Element};
use tracing::debug;

use crate::{is_eligible, InterruptFlag, Strategy};

/// Selects every pending element whose asset is not dirty.
///
/// Two elements sharing an asset may both be returned; the aggregator
/// claims assets as it dispatches, so the second one waits for a later tick.
#[derive(Debug, Default)]
pub struct ParallelStrategy {
    interrupted: InterruptFlag,
}

impl ParallelStrategy {
    /// Create a running parallel strategy.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Element> Strategy<T> for ParallelStrategy {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn candidates<'a>(&self, elements: &'a [T], dirty_assets: &DirtyAssets) -> Vec<&'a T> {
        if self.interrupted.is_set() {
            return Vec::new();
        }

        elements
            .iter()
            .filter(|e| is_eligible(*e, dirty_assets))
            .collect()
    }

    fn interrupt(&self) {
        debug!("Interrupting parallel strategy");
        self.interrupted.set();
    }

    fn proceed(&self) {
        debug!("Proceeding parallel strategy");
        self.interrupted.clear();
    }

    fn is_interrupted(&self) -> bool {
        self.interrupted.is_set()
    }
}
