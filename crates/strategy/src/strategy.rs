//! The strategy interface.

use cadence_core::{DirtyAssets, Element};

/// Policy selecting which elements of a group may be dispatched this tick.
///
/// Implementations hold no per-call state. `candidates` must never return an
/// element that is complete or whose asset is in `dirty_assets`, and must
/// return nothing while the strategy is interrupted.
pub trait Strategy<T: Element>: Send + Sync {
    /// Policy name, as used in plan definitions.
    fn name(&self) -> &'static str;

    /// Select candidates from the group's elements, given in declaration
    /// order.
    fn candidates<'a>(&self, elements: &'a [T], dirty_assets: &DirtyAssets) -> Vec<&'a T>;

    /// Pause candidate selection. Idempotent.
    fn interrupt(&self);

    /// Resume candidate selection. Idempotent.
    fn proceed(&self);

    /// Whether candidate selection is paused.
    fn is_interrupted(&self) -> bool;

    /// Release the next element held behind an operator approval gate.
    ///
    /// Returns false when the strategy has no gate or it is already fully
    /// open. Approval never clears an interrupt and `proceed` never approves.
    fn approve(&self) -> bool {
        false
    }

    /// Whether selection over `elements` is held until the next
    /// [`approve`](Strategy::approve).
    fn awaiting_approval(&self, _elements: &[T]) -> bool {
        false
    }
}

/// The predicate every built-in policy starts from: pending, not complete,
/// and not blocked by a dirty asset.
///
/// Elements that are neither pending nor complete (in flight, waiting or
/// errored) fail it, so they are skipped without dirtying their asset.
pub fn is_eligible<T: Element + ?Sized>(element: &T, dirty_assets: &DirtyAssets) -> bool {
    element.is_pending() && !element.is_complete() && !dirty_assets.blocks(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{Status, Step};

    #[test]
    fn test_eligible_requires_pending() {
        let dirty = DirtyAssets::new();
        assert!(is_eligible(&Step::new("a"), &dirty));
        assert!(is_eligible(&Step::new("a").with_status(Status::Prepared), &dirty));
        for status in [
            Status::Starting,
            Status::InProgress,
            Status::Waiting,
            Status::Error,
            Status::Complete,
        ] {
            let step = Step::new("a").with_status(status);
            assert!(!is_eligible(&step, &dirty), "{status}");
        }
    }

    #[test]
    fn test_eligible_respects_dirty_assets() {
        let dirty: DirtyAssets = ["node-0"].into_iter().collect();
        assert!(!is_eligible(&Step::new("a").with_asset("node-0"), &dirty));
        assert!(is_eligible(&Step::new("b").with_asset("node-1"), &dirty));
        assert!(is_eligible(&Step::new("c"), &dirty));
    }
}
