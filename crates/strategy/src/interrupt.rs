//! Pause/resume flag owned by one strategy instance.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Interrupt flag shared between a strategy and whoever pauses it.
///
/// Clones observe the same flag. Reads and writes are sequentially
/// consistent, so a change made on an operator thread is seen by the next
/// candidate computation on the scheduler thread.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    /// Create a cleared flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a flag that starts set.
    pub fn interrupted() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// Set the flag.
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Clear the flag.
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Whether the flag is set.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
