//! Canary strategy - operator-approved rollout of the first few elements.

use std::sync::atomic::{AtomicUsize, Ordering};

use cadence_core::{DirtyAssets, Element};
use tracing::{debug, info};

use crate::{is_eligible, InterruptFlag, Result, Strategy, StrategyError};

/// Default number of canaries for the `*-canary` strategy kinds.
pub const DEFAULT_CANARY_COUNT: usize = 2;

/// Rolls the first `canary_count` elements out one at a time, each behind an
/// explicit [`approve`](Strategy::approve), then hands the group to the
/// wrapped strategy.
///
/// Nothing is offered until the first approval. Once an approved canary
/// completes the strategy waits for the next approval, and the approval
/// after the last canary switches to the wrapped strategy for good.
/// Interrupt and proceed only pause and resume; they never approve.
#[derive(Debug)]
pub struct CanaryStrategy<S> {
    inner: S,
    canary_count: usize,
    approved: AtomicUsize,
    interrupted: InterruptFlag,
}

impl<S> CanaryStrategy<S> {
    /// Wrap `inner` behind `canary_count` approved canaries.
    pub fn new(inner: S, canary_count: usize) -> Result<Self> {
        if canary_count == 0 {
            return Err(StrategyError::InvalidCanaryCount);
        }
        Ok(Self::gated(inner, canary_count))
    }

    /// Wrap `inner` behind [`DEFAULT_CANARY_COUNT`] canaries.
    pub fn with_default_count(inner: S) -> Self {
        Self::gated(inner, DEFAULT_CANARY_COUNT)
    }

    fn gated(inner: S, canary_count: usize) -> Self {
        Self {
            inner,
            canary_count,
            approved: AtomicUsize::new(0),
            interrupted: InterruptFlag::new(),
        }
    }

    /// Canaries approved so far.
    pub fn approved(&self) -> usize {
        self.approved.load(Ordering::SeqCst).min(self.canary_count)
    }

    /// Whether the wrapped strategy has not taken over yet.
    pub fn is_canary_stage(&self) -> bool {
        self.approved.load(Ordering::SeqCst) <= self.canary_count
    }
}

impl<T, S> Strategy<T> for CanaryStrategy<S>
where
    T: Element,
    S: Strategy<T>,
{
    fn name(&self) -> &'static str {
        match self.inner.name() {
            "serial" => "serial-canary",
            "parallel" => "parallel-canary",
            "dependency" => "dependency-canary",
            _ => "canary",
        }
    }

    fn candidates<'a>(&self, elements: &'a [T], dirty_assets: &DirtyAssets) -> Vec<&'a T> {
        if self.interrupted.is_set() {
            return Vec::new();
        }

        let approved = self.approved.load(Ordering::SeqCst);
        if approved > self.canary_count {
            return self.inner.candidates(elements, dirty_assets);
        }

        elements
            .iter()
            .take(approved)
            .find(|e| !e.is_complete())
            .filter(|e| is_eligible(*e, dirty_assets))
            .into_iter()
            .collect()
    }

    fn interrupt(&self) {
        debug!("Interrupting {} strategy", Strategy::<T>::name(self));
        self.interrupted.set();
    }

    fn proceed(&self) {
        debug!("Proceeding {} strategy", Strategy::<T>::name(self));
        self.interrupted.clear();
    }

    fn is_interrupted(&self) -> bool {
        self.interrupted.is_set()
    }

    fn approve(&self) -> bool {
        let limit = self.canary_count;
        let bumped = self
            .approved
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| (n <= limit).then_some(n + 1));

        match bumped {
            Ok(previous) if previous == limit => {
                info!("Canary stage finished, handing off to {}", self.inner.name());
                true
            }
            Ok(previous) => {
                info!("Approved canary {} of {}", previous + 1, limit);
                true
            }
            Err(_) => false,
        }
    }

    fn awaiting_approval(&self, elements: &[T]) -> bool {
        let approved = self.approved.load(Ordering::SeqCst);
        approved <= self.canary_count
            && elements.iter().take(approved).all(|e| e.is_complete())
            && elements.iter().any(|e| !e.is_complete())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{complete, names, steps};
    use crate::{ParallelStrategy, SerialStrategy};
    use cadence_core::{Status, Step};

    fn select<'a, S: Strategy<Step>>(
        strategy: &CanaryStrategy<S>,
        steps: &'a [Step],
    ) -> Vec<&'a str> {
        names(strategy.candidates(steps, &DirtyAssets::new()))
    }

    fn approve<S: Strategy<Step>>(strategy: &CanaryStrategy<S>) -> bool {
        Strategy::<Step>::approve(strategy)
    }

    fn waiting<S: Strategy<Step>>(strategy: &CanaryStrategy<S>, steps: &[Step]) -> bool {
        Strategy::<Step>::awaiting_approval(strategy, steps)
    }

    fn pause_and_resume<S: Strategy<Step>>(strategy: &CanaryStrategy<S>) {
        Strategy::<Step>::interrupt(strategy);
        Strategy::<Step>::proceed(strategy);
    }

    #[test]
    fn test_zero_canaries_rejected() {
        assert_eq!(
            CanaryStrategy::new(ParallelStrategy::new(), 0).unwrap_err(),
            StrategyError::InvalidCanaryCount
        );
    }

    #[test]
    fn test_waits_for_first_approval() {
        let strategy = CanaryStrategy::new(ParallelStrategy::new(), 2).unwrap();
        let steps = steps(4);
        assert!(!Strategy::<Step>::is_interrupted(&strategy));
        assert!(waiting(&strategy, &steps));
        assert!(select(&strategy, &steps).is_empty());
    }

    #[test]
    fn test_canaries_then_parallel_handoff() {
        let strategy = CanaryStrategy::new(ParallelStrategy::new(), 2).unwrap();
        let mut steps = steps(4);

        assert!(approve(&strategy));
        assert_eq!(select(&strategy, &steps), ["step0"]);
        assert!(!waiting(&strategy, &steps));

        complete(&mut steps[0]);
        // First canary done, second not yet approved
        assert!(select(&strategy, &steps).is_empty());
        assert!(waiting(&strategy, &steps));

        assert!(approve(&strategy));
        assert_eq!(select(&strategy, &steps), ["step1"]);
        complete(&mut steps[1]);
        assert!(select(&strategy, &steps).is_empty());
        assert!(strategy.is_canary_stage());

        assert!(approve(&strategy));
        assert!(!strategy.is_canary_stage());
        assert!(!waiting(&strategy, &steps));
        assert_eq!(select(&strategy, &steps), ["step2", "step3"]);

        // Gate is fully open
        assert!(!approve(&strategy));
    }

    #[test]
    fn test_early_approval_queues_next_canary_serially() {
        let strategy = CanaryStrategy::new(SerialStrategy::new(), 2).unwrap();
        let mut steps = steps(3);

        approve(&strategy);
        approve(&strategy);
        assert_eq!(strategy.approved(), 2);
        assert_eq!(select(&strategy, &steps), ["step0"]);

        complete(&mut steps[0]);
        assert_eq!(select(&strategy, &steps), ["step1"]);
    }

    #[test]
    fn test_pause_and_resume_never_approve() {
        let strategy = CanaryStrategy::new(ParallelStrategy::new(), 1).unwrap();
        let mut steps = steps(3);

        // Before the first approval
        pause_and_resume(&strategy);
        assert!(select(&strategy, &steps).is_empty());
        assert_eq!(strategy.approved(), 0);

        // While the canary runs
        approve(&strategy);
        steps[0] = steps[0].clone().with_status(Status::InProgress);
        let before = select(&strategy, &steps);
        pause_and_resume(&strategy);
        assert_eq!(select(&strategy, &steps), before);
        assert!(strategy.is_canary_stage());

        // After the canary completes
        complete(&mut steps[0]);
        pause_and_resume(&strategy);
        assert!(select(&strategy, &steps).is_empty());
        assert!(waiting(&strategy, &steps));
    }

    #[test]
    fn test_interrupt_dominates_approval() {
        let strategy = CanaryStrategy::new(ParallelStrategy::new(), 1).unwrap();
        let steps = steps(2);

        Strategy::<Step>::interrupt(&strategy);
        assert!(approve(&strategy));
        assert!(select(&strategy, &steps).is_empty());
        assert_eq!(strategy.approved(), 1);

        Strategy::<Step>::proceed(&strategy);
        assert_eq!(select(&strategy, &steps), ["step0"]);
    }

    #[test]
    fn test_proceed_after_handoff_only_resumes() {
        let strategy = CanaryStrategy::new(ParallelStrategy::new(), 1).unwrap();
        let mut steps = steps(3);

        approve(&strategy);
        complete(&mut steps[0]);
        approve(&strategy);
        assert_eq!(select(&strategy, &steps), ["step1", "step2"]);

        Strategy::<Step>::interrupt(&strategy);
        assert!(select(&strategy, &steps).is_empty());
        Strategy::<Step>::proceed(&strategy);
        assert_eq!(select(&strategy, &steps), ["step1", "step2"]);
    }

    #[test]
    fn test_dirty_canary_waits() {
        let strategy = CanaryStrategy::new(ParallelStrategy::new(), 2).unwrap();
        let steps = steps(3);
        approve(&strategy);
        let dirty: DirtyAssets = ["step0"].into_iter().collect();
        assert!(strategy.candidates(&steps[..], &dirty).is_empty());
    }

    #[test]
    fn test_small_group_is_not_held() {
        let strategy = CanaryStrategy::new(ParallelStrategy::new(), 2).unwrap();
        let mut steps = steps(1);
        approve(&strategy);
        complete(&mut steps[0]);
        assert!(!waiting(&strategy, &steps));
    }

    #[test]
    fn test_name_reflects_wrapped_policy() {
        let serial = CanaryStrategy::with_default_count(SerialStrategy::new());
        let parallel = CanaryStrategy::with_default_count(ParallelStrategy::new());
        assert_eq!(Strategy::<Step>::name(&serial), "serial-canary");
        assert_eq!(Strategy::<Step>::name(&parallel), "parallel-canary");
    }
}
